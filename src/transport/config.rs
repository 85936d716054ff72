use std::fmt;
use std::time::Duration;

/// Address of the device's controller endpoint
///
/// Passed into the transport at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub request_timeout: Duration,
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 80,
            path: "/controller".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        let path = self.path.trim_start_matches('/');
        if self.port == 80 {
            format!("http://{}/{}", self.host, path)
        } else {
            format!("http://{}:{}/{}", self.host, self.port, path)
        }
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_matches_device_factory_address() {
        let endpoint = DeviceEndpoint::default();
        assert_eq!(endpoint.url(), "http://192.168.1.100/controller");
        assert_eq!(endpoint.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn non_default_port_and_path_are_included() {
        let endpoint = DeviceEndpoint::new("10.0.0.7", 8080).with_path("api/pad");
        assert_eq!(endpoint.url(), "http://10.0.0.7:8080/api/pad");
    }
}
