//! # Vehicle Number Generator Bot
//!
//! A Telegram bot that collects five short fields through a guided
//! conversation and replies with a text file of sequential vehicle numbers,
//! plus a TXT to CSV converter for `VEHICLE - PHONE` lists.

pub mod artifact;
pub mod bot;
pub mod config;
pub mod csv_converter;
pub mod dialogue;
pub mod errors;
pub mod generator;
pub mod localization;
