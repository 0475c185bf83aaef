use cgmath::Vector3;

/// Surface response of an object to the scene lights.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMaterial {
    pub tag: String,
    pub diffuse_color: Vector3<f32>,
    pub specular_color: Vector3<f32>,
    pub shininess: f32,
}

impl ObjectMaterial {
    pub fn new(
        tag: &str,
        diffuse_color: Vector3<f32>,
        specular_color: Vector3<f32>,
        shininess: f32,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            diffuse_color,
            specular_color,
            shininess,
        }
    }
}

impl Default for ObjectMaterial {
    /// Fully diffuse, no highlight. Used until a draw selects a material.
    fn default() -> Self {
        Self::new(
            "default",
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 0.0, 0.0),
            1.0,
        )
    }
}

/// Materials addressed by tag, in definition order.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<ObjectMaterial>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material. A later definition with an existing tag replaces the earlier one.
    pub fn define(&mut self, material: ObjectMaterial) {
        match self.materials.iter_mut().find(|m| m.tag == material.tag) {
            Some(existing) => {
                log::warn!("Material '{}' redefined", material.tag);
                *existing = material;
            }
            None => self.materials.push(material),
        }
    }

    pub fn find(&self, tag: &str) -> Option<&ObjectMaterial> {
        self.materials.iter().find(|m| m.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
