pub mod api;

pub mod config;

pub mod db;

pub mod entity;

pub mod options;

pub mod query;

pub mod repository;

pub mod usecase;

pub mod validate;

pub(crate) mod util;
