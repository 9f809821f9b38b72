//! Asset loading
//!
//! Only mesh text is parsed here; textures and shader sources are handed to
//! the libraries by the host application.

pub mod obj_loader;

pub use obj_loader::{ObjError, ObjLoader};
