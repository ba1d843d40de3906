//! Mock registry helpers

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::package_tgz;

/// Registry path of a package tarball (`/<name>/-/<name>-<version>.tgz`)
pub fn tarball_path(name: &str, version: &str) -> String {
    format!("/{name}/-/{name}-{version}.tgz")
}

/// Serve a valid tarball for `name@version`, expecting exactly `expected_hits` requests
pub async fn mount_package(server: &MockServer, name: &str, version: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(tarball_path(name, version)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(package_tgz(name, version)))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Full URL of a package tarball on the mock registry
pub fn tarball_url(server: &MockServer, name: &str, version: &str) -> String {
    format!("{}{}", server.uri(), tarball_path(name, version))
}
