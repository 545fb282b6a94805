//! The polls application: questions, choices and votes

pub mod managers;
pub mod models;
pub mod urls;
pub mod views;
