//! Wire protocol for the Depot registry.
//!
//! Defines the HTTP paths, request/response documents and the service
//! discovery document spoken between infrastructure-as-code clients, publishing
//! tools and the registry server. Storage backends use [`endpoints`] to build
//! the server-relative URLs they hand out, so issued links and routed paths
//! cannot drift apart.

pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod message;

pub use discovery::ServiceDiscovery;
pub use endpoint::{endpoints, HealthResponse};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    data_types, ErrorResponse, ModuleVersionList, ProviderVersionList, Request, RequestData,
    Response, ResponseData, PROVIDER_PROTOCOLS,
};
