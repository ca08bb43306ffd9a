use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Variables every studio screen knows how to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum KnownVariable {
    NombreContacto,
    NombreEvento,
    FechaEvento,
    LinkPromesa,
}

impl KnownVariable {
    pub const ALL: [KnownVariable; 4] = [
        KnownVariable::NombreContacto,
        KnownVariable::NombreEvento,
        KnownVariable::FechaEvento,
        KnownVariable::LinkPromesa,
    ];

    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            KnownVariable::NombreContacto => "Nombre contacto",
            KnownVariable::NombreEvento => "Nombre evento",
            KnownVariable::FechaEvento => "Fecha evento",
            KnownVariable::LinkPromesa => "Link promesa",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.key() == key)
    }
}

/// Human-readable chip label for a variable key, falling back to the key itself.
pub fn variable_label(key: &str) -> &str {
    match KnownVariable::from_key(key) {
        Some(known) => known.label(),
        None => key,
    }
}

/// Chip label for a portfolio link.
pub fn portfolio_label(slug: &str) -> String {
    format!("Portafolio: {slug}")
}

/// Values supplied by the embedding screen for preview and send.
///
/// A key mapped to `None` is treated exactly like a missing key: it stays unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBindings(BTreeMap<String, Option<String>>);

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// The bound value for `key`, if any.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Option::as_deref)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `key=value` pair as accepted on the command line. An empty value binds `None`.
    pub fn insert_pair(&mut self, pair: &str) -> Result<(), InvalidBinding> {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(InvalidBinding(pair.to_string()));
        };
        let key = key.trim();
        if !crate::segment::is_variable_key(key) {
            return Err(InvalidBinding(pair.to_string()));
        }
        let value = (!value.is_empty()).then(|| value.to_string());
        self.insert(key, value);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid variable binding `{0}`, expected key=value")]
pub struct InvalidBinding(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_keys_round_trip_through_labels() {
        assert_eq!(KnownVariable::FechaEvento.key(), "fecha_evento");
        assert_eq!(KnownVariable::LinkPromesa.to_string(), "link_promesa");
        assert_eq!(variable_label("nombre_contacto"), "Nombre contacto");
        assert_eq!(variable_label("codigo_descuento"), "codigo_descuento");
    }

    #[test]
    fn none_binding_is_unresolved() {
        let mut bindings = VariableBindings::new().with("nombre_contacto", "Ana");
        bindings.insert("nombre_evento", None);
        assert_eq!(bindings.resolve("nombre_contacto"), Some("Ana"));
        assert_eq!(bindings.resolve("nombre_evento"), None);
        assert_eq!(bindings.resolve("fecha_evento"), None);
    }

    #[test]
    fn parses_cli_pairs() {
        let mut bindings = VariableBindings::new();
        bindings
            .insert_pair("nombre_contacto=Ana María")
            .expect("valid pair");
        bindings.insert_pair("fecha_evento=").expect("empty value");
        assert_eq!(bindings.resolve("nombre_contacto"), Some("Ana María"));
        assert_eq!(bindings.resolve("fecha_evento"), None);
        assert_eq!(
            bindings.insert_pair("sin_igual"),
            Err(InvalidBinding("sin_igual".to_string()))
        );
        assert!(bindings.insert_pair("mal key=1").is_err());
    }
}
