//! Instance catalog — instance type → hardware shape.
//!
//! Loaded once at startup from the paginated inventory query and never
//! refreshed; hardware shapes are static facts. Lookups never fail: an
//! unknown type yields a zero shape, which suppresses the unit price split
//! but still lets the resource price through.

use std::collections::HashMap;

use tracing::{debug, info};

use pricing_core::InstanceShape;

use crate::cancel::{ScrapeCancel, paginate};
use crate::error::CatalogError;
use crate::source::PricingSource;

#[derive(Debug, Clone, Default)]
pub struct InstanceCatalog {
    shapes: HashMap<String, InstanceShape>,
}

impl InstanceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: impl IntoIterator<Item = InstanceShape>) -> Self {
        Self {
            shapes: shapes
                .into_iter()
                .map(|shape| (shape.instance_type.clone(), shape))
                .collect(),
        }
    }

    /// Query every page of the instance type inventory.
    ///
    /// Fails as a whole: a catalog is either complete or not loaded.
    pub async fn load(source: &dyn PricingSource) -> Result<Self, CatalogError> {
        let cancel = ScrapeCancel::never();
        let shapes = paginate(&cancel, |token| source.instance_types(token)).await?;
        let catalog = Self::from_shapes(shapes);
        info!(instance_types = catalog.len(), "instance catalog loaded");
        Ok(catalog)
    }

    /// Shape of `instance_type`, or a zero shape if unknown.
    pub fn lookup(&self, instance_type: &str) -> InstanceShape {
        match self.shapes.get(instance_type) {
            Some(shape) => shape.clone(),
            None => {
                debug!(%instance_type, "instance type not in catalog");
                InstanceShape::zero(instance_type)
            }
        }
    }

    /// Memory in MiB as a label value; `"0"` for unknown types.
    pub fn memory_label(&self, instance_type: &str) -> String {
        self.get(instance_type)
            .map_or(0, |shape| shape.memory_mib)
            .to_string()
    }

    /// vCPU count as a label value; `"0"` for unknown types.
    pub fn vcpu_label(&self, instance_type: &str) -> String {
        self.get(instance_type)
            .map_or(0, |shape| shape.vcpu_count)
            .to_string()
    }

    pub fn get(&self, instance_type: &str) -> Option<&InstanceShape> {
        self.shapes.get(instance_type)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
