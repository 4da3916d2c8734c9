//! Testing utilities for the OpenSearch provider.
//!
//! ## Features
//!
//! - **MockTransport** - Replays queued replies and records requests
//! - **TrackedBody** - Response body that counts closes
//! - **Fixtures** - Security plugin response shapes
//! - **Assertions** - Checks on recorded requests
//!
//! ## Mock Transport
//!
//! ```
//! use tfos_testing::*;
//! use tfos_client::{Role, SecurityClient};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let role = Role::new("Read-only");
//! let mock = MockTransport::new().with_response(roles_response(200, &[("readers", &role)]));
//! let client = SecurityClient::new(Arc::new(mock.clone()));
//!
//! let found = client.read_role("readers").await.unwrap();
//! assert_eq!(found, role);
//! assert_eq!(mock.call_count(), 1);
//! # });
//! ```

#![warn(missing_docs)]

mod assertions;
mod fixtures;
mod mock;

pub use assertions::*;
pub use fixtures::*;
pub use mock::{CloseCounter, MockTransport, TrackedBody};
