//! Caption and catalogue site photos from their embedded metadata.
//!
//! A photos folder is read once into a [`session::Session`]; each stage then
//! works from the editable photo log (`Photo Log.csv`) in that folder.

pub mod annotate;
pub mod app;
pub mod config;
pub mod contact_sheet;
pub mod error;
pub mod logging;
pub mod menu;
pub mod metadata;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod photo_log;
pub mod report;
pub mod session;
pub mod writeback;
