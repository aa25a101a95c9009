// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request seen by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

/// A mock HTTP service that returns predefined responses based on request paths
/// and records every request it receives.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    // Exact matches only: a list path is a prefix of every object path below it
    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let bytes = req.into_body().collect().await?.to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                body,
            });

            let (status, body) = response.unwrap_or_else(|| {
                // Default 404 for unmatched requests
                (404, fixtures::status_json(404, "NotFound", "not found"))
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Objects shaped like the ones a real cluster would return
pub mod fixtures {
    use crate::constants::annotations;
    use k8s_openapi::api::apps::v1::{
        DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec,
    };
    use k8s_openapi::api::core::v1::{
        ConfigMap, ConfigMapEnvSource, ConfigMapKeySelector, ConfigMapProjection,
        ConfigMapVolumeSource, Container, EnvFromSource, EnvVar, EnvVarSource, KeyToPath,
        PodSpec, PodTemplateSpec, ProjectedVolumeSource, Secret, SecretEnvSource,
        SecretKeySelector, SecretProjection, SecretVolumeSource, Volume, VolumeProjection,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
        LabelSelector, ObjectMeta, OwnerReference,
    };
    use k8s_openapi::ByteString;
    use kube::Resource;
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([("app".to_string(), "example".to_string())])
    }

    fn extra_annotations() -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                annotations::EXTRA_CONFIGMAPS.to_string(),
                "ns1/test-cm1,ns2/test-cm2,local-cm1".to_string(),
            ),
            (
                annotations::EXTRA_SECRETS.to_string(),
                "ns1/test-secret1,ns2/test-secret2,local-secret1".to_string(),
            ),
        ])
    }

    fn workload_meta() -> ObjectMeta {
        ObjectMeta {
            name: Some("example".to_string()),
            namespace: Some("default".to_string()),
            uid: Some("example-uid".to_string()),
            resource_version: Some("1".to_string()),
            labels: Some(labels()),
            annotations: Some(extra_annotations()),
            ..Default::default()
        }
    }

    fn selector() -> LabelSelector {
        LabelSelector {
            match_labels: Some(labels()),
            ..Default::default()
        }
    }

    fn volume(name: &str) -> Volume {
        Volume {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn secret_volume(name: &str, secret: &str, optional: bool) -> Volume {
        Volume {
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret.to_string()),
                optional: optional.then_some(true),
                ..Default::default()
            }),
            ..volume(name)
        }
    }

    fn config_map_volume(name: &str, cm: &str, optional: bool) -> Volume {
        Volume {
            config_map: Some(ConfigMapVolumeSource {
                name: cm.to_string(),
                optional: optional.then_some(true),
                ..Default::default()
            }),
            ..volume(name)
        }
    }

    fn projected(name: &str, source: VolumeProjection) -> Volume {
        Volume {
            projected: Some(ProjectedVolumeSource {
                sources: Some(vec![source]),
                ..Default::default()
            }),
            ..volume(name)
        }
    }

    fn items(keys: &[&str], prefix: &str) -> Option<Vec<KeyToPath>> {
        Some(
            keys.iter()
                .map(|k| KeyToPath {
                    key: k.to_string(),
                    path: format!("{}_{}.txt", prefix, k),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn cm_env(var: &str, cm: &str, key: &str, optional: bool) -> EnvVar {
        EnvVar {
            name: var.to_string(),
            value_from: Some(EnvVarSource {
                config_map_key_ref: Some(ConfigMapKeySelector {
                    name: cm.to_string(),
                    key: key.to_string(),
                    optional: optional.then_some(true),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn secret_env(var: &str, secret: &str, key: &str, optional: bool) -> EnvVar {
        EnvVar {
            name: var.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.to_string(),
                    key: key.to_string(),
                    optional: optional.then_some(true),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn cm_env_from(cm: &str, optional: bool) -> EnvFromSource {
        EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: cm.to_string(),
                optional: optional.then_some(true),
            }),
            ..Default::default()
        }
    }

    fn secret_env_from(secret: &str, optional: bool) -> EnvFromSource {
        EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: secret.to_string(),
                optional: optional.then_some(true),
            }),
            ..Default::default()
        }
    }

    /// Pod template referencing ConfigMaps and Secrets through every supported path
    pub fn pod_template() -> PodTemplateSpec {
        let volumes = vec![
            secret_volume("secret1", "example1", false),
            secret_volume("secret-optional", "volume-optional", true),
            config_map_volume("configmap1", "example1", false),
            config_map_volume("configmap-optional", "volume-optional", true),
            projected(
                "projection1",
                VolumeProjection {
                    secret: Some(SecretProjection {
                        name: "example5".to_string(),
                        optional: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
            projected(
                "projection2",
                VolumeProjection {
                    config_map: Some(ConfigMapProjection {
                        name: "example5".to_string(),
                        optional: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
            projected(
                "projection3",
                VolumeProjection {
                    secret: Some(SecretProjection {
                        name: "example6".to_string(),
                        items: items(&["key1", "key3"], "example6"),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
            projected(
                "projection4",
                VolumeProjection {
                    config_map: Some(ConfigMapProjection {
                        name: "example6".to_string(),
                        items: items(&["key1", "key3"], "example6"),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
        ];

        let container1 = Container {
            name: "container1".to_string(),
            image: Some("container1".to_string()),
            env: Some(vec![
                cm_env("example1_key1", "example1", "key1", false),
                cm_env("example1_key1_new_name", "example1", "key1", false),
                cm_env("example3_key1", "example3", "key1", false),
                cm_env("example3_key4", "example3", "key4", true),
                cm_env("example4_key1", "example4", "key1", true),
                secret_env("example1_secret_key1", "example1", "key1", false),
                secret_env("example3_secret_key1", "example3", "key1", false),
                secret_env("example3_secret_key4", "example3", "key4", true),
                secret_env("example4_secret_key1", "example4", "key1", true),
            ]),
            env_from: Some(vec![
                cm_env_from("example1", false),
                cm_env_from("envfrom-optional", true),
                secret_env_from("example1", false),
                secret_env_from("envfrom-optional", true),
            ]),
            ..Default::default()
        };

        let container2 = Container {
            name: "container2".to_string(),
            image: Some("container2".to_string()),
            env: Some(vec![
                cm_env("env_optional_key2", "env-optional", "key2", true),
                cm_env("example3_key2", "example3", "key2", false),
                secret_env("example3_secret_key2", "example3", "key2", false),
                secret_env("env_optional_secret_key2", "env-optional", "key2", true),
            ]),
            env_from: Some(vec![
                cm_env_from("example2", false),
                secret_env_from("example2", false),
            ]),
            ..Default::default()
        };

        PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(labels()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                scheduler_name: Some("default-scheduler".to_string()),
                volumes: Some(volumes),
                containers: vec![container1, container2],
                ..Default::default()
            }),
        }
    }

    /// Deployment `default/example` carrying the extra-dependency annotations, not opted in
    pub fn deployment() -> Deployment {
        Deployment {
            metadata: workload_meta(),
            spec: Some(DeploymentSpec {
                selector: selector(),
                template: pod_template(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn statefulset() -> StatefulSet {
        StatefulSet {
            metadata: workload_meta(),
            spec: Some(StatefulSetSpec {
                selector: selector(),
                template: pod_template(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn daemonset() -> DaemonSet {
        DaemonSet {
            metadata: workload_meta(),
            spec: Some(DaemonSetSpec {
                selector: selector(),
                template: pod_template(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn dependency_meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            resource_version: Some("1".to_string()),
            labels: Some(labels()),
            ..Default::default()
        }
    }

    fn string_data(prefix: &str) -> BTreeMap<String, String> {
        ["key1", "key2", "key3"]
            .iter()
            .map(|k| (k.to_string(), format!("{}:{}", prefix, k)))
            .collect()
    }

    fn byte_data(prefix: &str, keys: &[&str]) -> BTreeMap<String, ByteString> {
        keys.iter()
            .map(|k| (k.to_string(), ByteString(format!("{}:{}", prefix, k).into_bytes())))
            .collect()
    }

    pub fn config_map(name: &str) -> ConfigMap {
        ConfigMap {
            metadata: dependency_meta(name),
            data: Some(string_data(name)),
            ..Default::default()
        }
    }

    /// `default/example1` with both text and binary data
    pub fn config_map1() -> ConfigMap {
        ConfigMap {
            binary_data: Some(byte_data(
                "example1",
                &["binary_key1", "binary_key2", "binary_key3"],
            )),
            ..config_map("example1")
        }
    }

    pub fn config_map2() -> ConfigMap {
        config_map("example2")
    }

    pub fn config_map3() -> ConfigMap {
        config_map("example3")
    }

    pub fn secret(name: &str) -> Secret {
        Secret {
            metadata: dependency_meta(name),
            data: Some(byte_data(name, &["key1", "key2", "key3"])),
            ..Default::default()
        }
    }

    pub fn secret1() -> Secret {
        secret("example1")
    }

    pub fn secret2() -> Secret {
        secret("example2")
    }

    pub fn secret3() -> Secret {
        secret("example3")
    }

    /// Non-controlling reference to the `default/example` Deployment
    pub fn owner_reference(uid: &str) -> OwnerReference {
        OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "example".to_string(),
            uid: uid.to_string(),
            controller: Some(false),
            block_owner_deletion: Some(false),
        }
    }

    pub fn json<T: Serialize>(obj: &T) -> String {
        serde_json::to_string(obj).unwrap()
    }

    /// List response of `kind` holding `items`
    pub fn list_json<T>(kind: &str, items: &[T]) -> String
    where
        T: Resource<DynamicType = ()> + Serialize,
    {
        serde_json::json!({
            "apiVersion": T::api_version(&()),
            "kind": kind,
            "metadata": { "resourceVersion": "1" },
            "items": items,
        })
        .to_string()
    }

    /// Create an API error Status response
    pub fn status_json(code: u16, reason: &str, message: &str) -> String {
        serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code
        })
        .to_string()
    }
}
