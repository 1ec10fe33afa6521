//! study-sync web server and UI.
//!
//! With `ssr` this crate is the axum server: provider login, the session
//! and bearer gate, and the REST API over posts, resources and file uploads. With
//! `hydrate` it is the browser client that reconciles who is signed in and
//! calls that API.

#![allow(non_snake_case)]

pub mod app;
pub mod pages;

#[cfg(feature = "ssr")]
pub mod api;
#[cfg(feature = "ssr")]
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod db;
#[cfg(feature = "ssr")]
pub mod error;
#[cfg(feature = "ssr")]
pub mod router;
#[cfg(feature = "ssr")]
pub mod storage;

#[cfg(feature = "hydrate")]
mod browser;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
