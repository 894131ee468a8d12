//! GitHub login flow
//!
//! [`AuthenticationFlow`] drives a login from the provider redirect to a
//! resolved [`Principal`]; [`AuthenticationServiceFactory`] wires it from
//! settings.

pub mod connection;
pub mod factory;
pub mod flow;
pub mod outcome;

pub use connection::{ConnectionProvider, SettingsConnectionProvider};
pub use factory::AuthenticationServiceFactory;
pub use flow::{AuthenticationFlow, FlowConfig};
pub use outcome::{AuthOutcome, FlowError, Principal, RejectReason};
