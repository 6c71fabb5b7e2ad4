//! Route table: every route path and the authorization strategy it runs.
//!
//! Paths are relative to the configured API prefix. Routes missing from
//! [`ROUTE_POLICY`] fall back to [`Strategy::BearerToken`].

use axum::http::Method;

pub const AUTH_LOGIN: &str = "/auth/login";
pub const USER: &str = "/user";
pub const USER_PROFILE: &str = "/user/profile";
pub const USER_LIST: &str = "/user/list";
pub const USER_ID: &str = "/user/{id}";
pub const USER_FORGOT_PASSWORD: &str = "/user/forgot-password";
pub const USER_RESET_CONFIRM: &str = "/user/reset/confirm";
pub const HEALTH: &str = "/health";

/// Per-route authorization check run before the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Always allow.
    Bypass,
    /// `Authorization` header must equal the provisioning secret.
    StaticSecret,
    /// `Authorization: Bearer <session token>`; resolves the caller's id.
    BearerToken,
    /// `{identifier, secret}` body checked against the stored hash.
    LoginCredential,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub method: &'static str,
    pub path: &'static str,
    pub strategy: Strategy,
}

const fn rule(method: &'static str, path: &'static str, strategy: Strategy) -> RouteRule {
    RouteRule {
        method,
        path,
        strategy,
    }
}

pub const ROUTE_POLICY: &[RouteRule] = &[
    rule("POST", AUTH_LOGIN, Strategy::LoginCredential),
    rule("POST", USER, Strategy::StaticSecret),
    rule("GET", USER_PROFILE, Strategy::BearerToken),
    rule("GET", USER_LIST, Strategy::BearerToken),
    rule("PUT", USER_ID, Strategy::BearerToken),
    rule("DELETE", USER_ID, Strategy::BearerToken),
    rule("POST", USER_FORGOT_PASSWORD, Strategy::Bypass),
    rule("GET", USER_RESET_CONFIRM, Strategy::Bypass),
    rule("PUT", USER_RESET_CONFIRM, Strategy::Bypass),
    rule("GET", HEALTH, Strategy::Bypass),
];

/// Strategy for a matched route path (without prefix).
///
/// `HEAD` is served by the `GET` handler, so it shares the `GET` rule.
pub fn strategy_for(method: &Method, path: &str) -> Strategy {
    let method = if *method == Method::HEAD {
        &Method::GET
    } else {
        method
    };
    ROUTE_POLICY
        .iter()
        .find(|r| r.method == method.as_str() && r.path == path)
        .map_or(Strategy::BearerToken, |r| r.strategy)
}
