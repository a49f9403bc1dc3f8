use crate::{Connection, Result};
use std::{borrow::Cow, future::Future};

pub trait Driver: Send + Sync {
    type Connection: Connection<Driver = Self>;

    /// Name of the driver, also the scheme of its connection URLs.
    const NAME: &'static str;

    /// Create a connection (still closed) to the given URL.
    fn connect(&self, url: Cow<'static, str>) -> impl Future<Output = Result<Self::Connection>> {
        Self::Connection::connect(url)
    }
}
