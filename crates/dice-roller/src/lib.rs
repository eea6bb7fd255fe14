//! # dice-roller
//!
//! A shared dice roller, a shared text field and a shared rotating cube.
//!
//! Every participant opens the same shared document. The participant that
//! creates it (the originator) animates the cube and publishes its rotation;
//! everybody else mirrors it. Anyone may roll the dice or edit the text.
//!
//! ```text
//! bootstrap (create or join) ──► field binders (dice, text, rotation)
//!                              └► render loop (advance, publish, redraw)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use dice_roller::config::AppConfig;
//! use dice_roller::participant::Participant;
//! use dice_roller::scene::LogRenderer;
//! use dice_roller::session::SessionAddress;
//! use collab_client::{LocalService, ServiceConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let config = AppConfig::default();
//! let service = LocalService::new(ServiceConfig::default());
//!
//! let host_address = SessionAddress::parse("http://localhost:8080/");
//! let mut host = Participant::start(&service, &host_address, &config, Box::new(LogRenderer::new()))
//!     .await
//!     .unwrap();
//!
//! let mut guest = Participant::start(&service, host.address(), &config, Box::new(LogRenderer::new()))
//!     .await
//!     .unwrap();
//!
//! host.frame();
//! guest.pump();
//! assert_eq!(guest.cube_rotation(), host.cube_rotation());
//! # });
//! ```

pub mod binders;
pub mod config;
pub mod logging;
pub mod participant;
pub mod render;
pub mod scene;
pub mod session;
pub mod ui;
