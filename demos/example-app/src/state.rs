/// A stand-in caller identity: the demo has no real authentication layer,
/// so delegates extract roles from a `roles` field carried alongside the
/// request body instead of a token.
pub struct DemoPrincipal {
    pub roles: Vec<String>,
}

impl neatoo_factory::Principal for DemoPrincipal {
    fn roles(&self) -> &[String] {
        &self.roles
    }
}

impl DemoPrincipal {
    pub fn from_roles(roles: &serde_json::Value) -> Self {
        let roles = roles
            .as_array()
            .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        DemoPrincipal { roles }
    }
}
