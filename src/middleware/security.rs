use crate::context::Context;
use crate::handler::Handler;
use crate::http::Method;

#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub hsts: bool,
    pub xss_protection: bool,
    pub content_type_options: bool,
    pub frame_options: Option<String>,
    pub content_security_policy: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hsts: true,
            xss_protection: true,
            content_type_options: true,
            frame_options: Some("DENY".to_string()),
            content_security_policy: None,
        }
    }
}

/// Adds security headers once the rest of the chain has produced a response.
pub struct SecurityHeaders {
    config: SecurityConfig,
}

impl SecurityHeaders {
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }
}

impl Handler for SecurityHeaders {
    fn call(&self, c: &mut Context) {
        c.next();

        let config = &self.config;
        if config.hsts {
            c.set_header("Strict-Transport-Security", "max-age=31536000");
        }
        if config.xss_protection {
            c.set_header("X-XSS-Protection", "1; mode=block");
        }
        if config.content_type_options {
            c.set_header("X-Content-Type-Options", "nosniff");
        }
        if let Some(frame_options) = &config.frame_options {
            c.set_header("X-Frame-Options", frame_options);
        }
        if let Some(policy) = &config.content_security_policy {
            c.set_header("Content-Security-Policy", policy);
        }
    }
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u32>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: false,
            max_age: Some(86400),
        }
    }
}

impl CorsConfig {
    fn allows(&self, origin: &str) -> bool {
        self.allow_origins.iter().any(|o| o == "*" || o == origin)
    }
}

/// Answers preflight `OPTIONS` requests without running the rest of the
/// chain and stamps the allowed origin on every other response.
pub struct Cors {
    config: CorsConfig,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }
}

impl Handler for Cors {
    fn call(&self, c: &mut Context) {
        let config = &self.config;
        let origin = c.header("origin").map(str::to_string);

        if c.method() == Method::OPTIONS {
            c.status(204);
            c.set_header("Access-Control-Allow-Methods", &config.allow_methods.join(", "));
            c.set_header("Access-Control-Allow-Headers", &config.allow_headers.join(", "));
            if let Some(max_age) = config.max_age {
                c.set_header("Access-Control-Max-Age", &max_age.to_string());
            }
        } else {
            c.next();
        }

        if let Some(origin) = origin.filter(|origin| config.allows(origin)) {
            c.set_header("Access-Control-Allow-Origin", &origin);
        }
        if config.allow_credentials {
            c.set_header("Access-Control-Allow-Credentials", "true");
        }
    }
}
