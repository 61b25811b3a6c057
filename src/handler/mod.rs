use crate::context::Context;
use std::sync::Arc;

/// Anything that can take part in a request chain: route handlers and
/// middleware alike. A middleware calls [`Context::next`] to run the rest of
/// the chain; returning without calling it ends the chain.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, c: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn call(&self, c: &mut Context) {
        (self)(c)
    }
}

/// Shared handle to a handler; cheap to clone into every request chain.
pub type HandlerFunc = Arc<dyn Handler>;

pub(crate) fn not_found() -> HandlerFunc {
    Arc::new(|c: &mut Context| {
        let body = format!("404 NOT FOUND: {}\n", c.path());
        c.string(404, body);
    })
}
