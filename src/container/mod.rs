use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container (or sandbox) identifier.
///
/// Cloning is cheap: the id is shared behind an [`Arc`], so it can be used as a
/// key in several maps at once.
///
/// # Examples
///
/// ```
/// # use cri_stats::container::ContainerID;
/// let container_id = ContainerID::new("4b2f0c3e9d").unwrap();
/// assert_eq!(container_id.as_ref(), "4b2f0c3e9d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length
    /// exceeds [`CONTAINER_ID_MAX_LEN`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use cri_stats::container::ContainerID;
    /// assert!(ContainerID::new("").is_err());
    /// assert!(ContainerID::new("c1").is_ok());
    /// ```
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Name and creation attempt of a container, as given in its creation config.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ContainerMetadata {
    /// Name of the container. Same as the container name in the pod spec.
    pub name: String,
    /// Attempt number of creating the container.
    pub attempt: u32,
}

/// Identity of a container at stats-collection time.
///
/// This is a snapshot copied out of the metadata store; nothing in this crate
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerAttributes {
    pub id: ContainerID,
    pub metadata: ContainerMetadata,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
}

impl ContainerAttributes {
    /// Creates attributes with the given id and metadata and no labels or annotations.
    pub fn new(id: ContainerID, metadata: ContainerMetadata) -> Self {
        Self {
            id,
            metadata,
            labels: HashMap::default(),
            annotations: HashMap::default(),
        }
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_annotations(mut self, annotations: HashMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_rejects_empty_and_oversized() {
        assert!(matches!(
            ContainerID::new(""),
            Err(Error::InvalidContainerID(_))
        ));
        let long = "a".repeat(CONTAINER_ID_MAX_LEN + 1);
        assert!(matches!(
            ContainerID::new(&long),
            Err(Error::InvalidContainerID(id)) if id == long
        ));
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN)).is_ok());
    }

    #[test]
    fn test_container_id_borrows_as_str() {
        let id = ContainerID::new("c1").unwrap();
        let mut map = HashMap::new();
        map.insert(id.clone(), 1);
        assert_eq!(map.get("c1"), Some(&1));
        assert_eq!(id.to_string(), "c1");
    }

    #[test]
    fn test_attributes_serialize_id_as_string() {
        let attrs = ContainerAttributes::new(
            ContainerID::new("c1").unwrap(),
            ContainerMetadata {
                name: "web".to_owned(),
                attempt: 2,
            },
        )
        .with_labels(HashMap::from([("app".to_owned(), "web".to_owned())]));

        let value = serde_json::to_value(&attrs).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["metadata"]["name"], "web");
        assert_eq!(value["metadata"]["attempt"], 2);
        assert_eq!(value["labels"]["app"], "web");
        assert!(value["annotations"].as_object().unwrap().is_empty());
    }
}
