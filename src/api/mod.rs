// =============================================================================
// API Module — inbound event ingress
// =============================================================================
//
// spec.md §1 scopes the transport (gRPC) and deserialization out of core;
// the real deployment target is a gRPC service. This Axum router is an
// explicit stand-in for that transport — same JSON event shapes, same
// `PipelineManager` dispatch, swappable for a tonic service without
// touching the pipeline itself.
// =============================================================================

pub mod rest;
