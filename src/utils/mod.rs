//! # Utility Modules
//!
//! Supporting utilities for cryptography and logging.
//!
//! ## Components
//! - **Crypto**: the cipher seam, plus plaintext and XChaCha20-Poly1305 impls
//! - **Logging**: structured logging configuration

pub mod crypto;
pub mod logging;

pub use crypto::{Cipher, PlainCipher, XChaChaCipher};
