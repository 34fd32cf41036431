use super::*;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Callers must hold `env_guard()` so env mutations do not race.
unsafe fn clear_portal_env() {
    unsafe {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("PORT");
        std::env::remove_var("PAYMENT_SESSION_URL");
        std::env::remove_var("PAYMENT_RETURN_URL");
        std::env::remove_var("PAYMENT_CURRENCY");
        std::env::remove_var("HTTP_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("HTTP_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("BOOKING_WIZARD_TTL_SECS");
        std::env::remove_var("RATING_RESET_DELAY_MS");
    }
}

#[test]
fn from_env_applies_defaults() {
    let _guard = env_guard();
    unsafe {
        clear_portal_env();
        std::env::set_var("SUPABASE_URL", "https://abc.supabase.co/");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
    }

    let cfg = PortalConfig::from_env().unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.supabase_url, "https://abc.supabase.co");
    assert_eq!(cfg.payment_session_url, "https://abc.supabase.co/functions/v1/create-payment-session");
    assert_eq!(cfg.payment_return_url, None);
    assert_eq!(cfg.currency, "PHP");
    assert_eq!(
        cfg.timeouts,
        HttpTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.wizard_ttl_secs, DEFAULT_WIZARD_TTL_SECS);
    assert_eq!(cfg.rating_reset_delay_ms, DEFAULT_RATING_RESET_DELAY_MS);

    unsafe { clear_portal_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_guard();
    unsafe {
        clear_portal_env();
        std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
        std::env::set_var("PORT", "8080");
        std::env::set_var("PAYMENT_SESSION_URL", "https://pay.example.test/session");
        std::env::set_var("PAYMENT_RETURN_URL", "https://portal.example.test/done");
        std::env::set_var("PAYMENT_CURRENCY", "USD");
        std::env::set_var("HTTP_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("HTTP_CONNECT_TIMEOUT_SECS", "2");
        std::env::set_var("BOOKING_WIZARD_TTL_SECS", "60");
        std::env::set_var("RATING_RESET_DELAY_MS", "500");
    }

    let cfg = PortalConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.payment_session_url, "https://pay.example.test/session");
    assert_eq!(cfg.payment_return_url.as_deref(), Some("https://portal.example.test/done"));
    assert_eq!(cfg.currency, "USD");
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.wizard_ttl_secs, 60);
    assert_eq!(cfg.rating_reset_delay_ms, 500);

    unsafe { clear_portal_env() };
}

#[test]
fn from_env_missing_url_errors() {
    let _guard = env_guard();
    unsafe {
        clear_portal_env();
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
    }

    let err = PortalConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));

    unsafe { clear_portal_env() };
}

#[test]
fn from_env_invalid_port_errors() {
    let _guard = env_guard();
    unsafe {
        clear_portal_env();
        std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
        std::env::set_var("PORT", "not-a-port");
    }

    let err = PortalConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("invalid value for PORT"));

    unsafe { clear_portal_env() };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let _guard = env_guard();
    unsafe {
        clear_portal_env();
        std::env::set_var("BOOKING_WIZARD_TTL_SECS", "soon");
    }
    assert_eq!(env_parse("BOOKING_WIZARD_TTL_SECS", 42_u64), 42);
    unsafe { clear_portal_env() };
}
