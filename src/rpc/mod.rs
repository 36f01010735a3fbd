//! Aura RPC layer of the target site
//!
//! The provider search is not a plain REST API: every call is an "Aura
//! action" - a form-encoded POST wrapping a JSON message envelope whose
//! nested input is itself JSON-encoded, and whose response double-wraps the
//! payload the same way. This module owns both directions: envelope/body
//! construction and response decoding, plus the per-request fingerprint
//! identifiers (fwuid, correlation ids) the page normally generates.

mod envelope;
mod response;

pub use envelope::{
    aura_headers, build_detail_body, build_search_body, detail_request_path, generate_fwuid,
    generate_request_ids, search_request_path, AuraSession, RequestIds,
};
pub use response::{decode_ip_result, ListingPage, ProviderRecord};
