//! HTTP adapter tests against a wiremock backend.
