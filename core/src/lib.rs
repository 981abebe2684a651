//! # Composable Chain Core
//!
//! Chain-of-responsibility pipelines with composable decorators.
//!
//! A [`Request`] carrying a domain payload travels through an ordered
//! [`Chain`] of [`Handler`]s. Each handler first decides, through its gate,
//! whether it applies; when it does, it processes the request and reports a
//! [`HandlerResult`] that either stops the traversal or lets it continue.
//!
//! ## Core Concepts
//!
//! - **Request**: payload, a typed result slot and a metadata bag
//! - **Handler**: gate (`can_handle`) plus processing step (`process`)
//! - **Chain**: ordered members walked by position, buildable into a head
//! - **Decoration**: behaviour around exactly one inner handler
//! - **SubChain**: a private chain exposed as one handler
//! - **Compensate**: reverse operations invoked by a transactional decoration
//!
//! ## Example
//!
//! ```
//! use composable_chain_core::prelude::*;
//!
//! struct Login {
//!     password: String,
//! }
//!
//! impl Payload for Login {
//!     type Outcome = String;
//!     type Fact = NoFacts;
//! }
//!
//! struct CheckPassword;
//! struct Welcome;
//!
//! impl Handler<Login> for CheckPassword {
//!     fn process(&self, request: &mut Request<Login>) -> Result<HandlerResult> {
//!         if request.payload().password == "secret123" {
//!             return Ok(HandlerResult::Continue);
//!         }
//!         request.set_result("Invalid password".to_string());
//!         Ok(HandlerResult::Handled)
//!     }
//! }
//!
//! impl Handler<Login> for Welcome {
//!     fn process(&self, request: &mut Request<Login>) -> Result<HandlerResult> {
//!         request.set_result("Access granted".to_string());
//!         Ok(HandlerResult::Handled)
//!     }
//! }
//!
//! let chain = Chain::new()
//!     .add_handler(CheckPassword.logged("password"))
//!     .add_handler(Welcome);
//!
//! let execution = chain.run(Login { password: "secret123".into() })?;
//! assert_eq!(execution.request.result()?, "Access granted");
//! # Ok::<(), ChainError>(())
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod chain;
pub mod compensation;
pub mod composition;
pub mod config;
pub mod decorators;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod request;
pub mod sub_chain;

pub use chain::{Chain, ChainHead, Execution, Links};
pub use compensation::{Compensate, Fallible, Transaction};
pub use composition::{Decorated, Decoration, HandlerExt, decorate};
pub use config::{ChainConfig, ChainConfigBuilder};
pub use decorators::{Gate, Logging, Timing, Transform};
pub use error::{ChainError, Result};
pub use handler::{Handler, HandlerResult};
pub use request::{Metadata, MetadataKey, MetadataValue, NoFacts, Payload, Request};
pub use sub_chain::SubChain;

/// Everything needed to define handlers and assemble chains.
pub mod prelude {
    pub use crate::chain::{Chain, ChainHead, Execution};
    pub use crate::compensation::{Compensate, Fallible};
    pub use crate::composition::{Decorated, Decoration, HandlerExt};
    pub use crate::config::ChainConfig;
    pub use crate::error::{ChainError, Result};
    pub use crate::handler::{Handler, HandlerResult};
    pub use crate::request::{MetadataValue, NoFacts, Payload, Request};
    pub use crate::sub_chain::SubChain;
}
