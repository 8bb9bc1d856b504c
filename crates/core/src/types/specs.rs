//! Product technical specifications.
//!
//! The backend stores specs in several shapes: a JSON object of label/value
//! pairs, an array of `"Label: value"` strings, or a single free-text string.
//! [`Specs`] normalizes all of them once, when a product is ingested, so the
//! rest of the code only ever sees two cases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder shown for empty spec values.
pub const EMPTY_VALUE: &str = "—";

/// Label used for free-text specs when rendered as rows.
pub const FREE_TEXT_LABEL: &str = "Details";

/// Errors that can occur when parsing specs from JSON text.
#[derive(Debug, Error)]
pub enum SpecsError {
    /// The text is not valid JSON.
    #[error("specs are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A single labelled specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Label (e.g., "RAM").
    pub label: String,
    /// Value (e.g., "16 GB DDR4").
    pub value: String,
}

impl SpecEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Normalized product specifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Specs {
    /// Ordered label/value pairs.
    KeyValueList(Vec<SpecEntry>),
    /// Unstructured description.
    FreeText(String),
}

impl Default for Specs {
    fn default() -> Self {
        Self::KeyValueList(Vec::new())
    }
}

impl Specs {
    /// Parse specs from JSON text as typed into the admin form.
    ///
    /// # Errors
    ///
    /// Returns [`SpecsError::InvalidJson`] if the text is not valid JSON.
    pub fn parse_json(text: &str) -> Result<Self, SpecsError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from(value))
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::KeyValueList(entries) => entries.is_empty(),
            Self::FreeText(text) => text.trim().is_empty(),
        }
    }

    /// Rows of `(label, value)` for display.
    #[must_use]
    pub fn rows(&self) -> Vec<(String, String)> {
        match self {
            Self::KeyValueList(entries) => entries
                .iter()
                .map(|e| (e.label.clone(), e.value.clone()))
                .collect(),
            Self::FreeText(text) => {
                let text = text.trim();
                let value = if text.is_empty() { EMPTY_VALUE } else { text };
                vec![(FREE_TEXT_LABEL.to_string(), value.to_string())]
            }
        }
    }

    /// Rows split into two display columns (left gets the extra row).
    #[must_use]
    pub fn columns(&self) -> (Vec<(String, String)>, Vec<(String, String)>) {
        let mut left = self.rows();
        let mid = left.len().div_ceil(2);
        let right = left.split_off(mid);
        (left, right)
    }

    /// Look up a value by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        match self {
            Self::KeyValueList(entries) => entries
                .iter()
                .find(|e| e.label == label)
                .map(|e| e.value.as_str()),
            Self::FreeText(_) => None,
        }
    }

    /// Set a labelled value, replacing an existing entry with the same label.
    ///
    /// Free text is kept as a leading entry under [`FREE_TEXT_LABEL`].
    pub fn set(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();

        if let Self::FreeText(text) = self {
            let text = std::mem::take(text);
            let entries = if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![SpecEntry::new(FREE_TEXT_LABEL, text)]
            };
            *self = Self::KeyValueList(entries);
        }

        if let Self::KeyValueList(entries) = self {
            match entries.iter_mut().find(|e| e.label == label) {
                Some(entry) => entry.value = value,
                None => entries.push(SpecEntry { label, value }),
            }
        }
    }

    /// Remove a labelled value. Returns whether an entry was removed.
    pub fn remove(&mut self, label: &str) -> bool {
        match self {
            Self::KeyValueList(entries) => {
                let before = entries.len();
                entries.retain(|e| e.label != label);
                entries.len() != before
            }
            Self::FreeText(_) => false,
        }
    }

    /// Lay the template fields of `product_type` over these specs.
    ///
    /// Template fields come first, in template order, filled with any
    /// existing value; entries outside the template follow unchanged.
    #[must_use]
    pub fn with_template(&self, product_type: ProductType) -> Self {
        let mut entries: Vec<SpecEntry> = product_type
            .spec_fields()
            .iter()
            .map(|field| SpecEntry::new(*field, self.get(field).unwrap_or_default()))
            .collect();

        match self {
            Self::KeyValueList(existing) => {
                for entry in existing {
                    if !product_type.spec_fields().contains(&entry.label.as_str()) {
                        entries.push(entry.clone());
                    }
                }
            }
            Self::FreeText(text) if !text.trim().is_empty() => {
                entries.push(SpecEntry::new(FREE_TEXT_LABEL, text.clone()));
            }
            Self::FreeText(_) => {}
        }

        Self::KeyValueList(entries)
    }
}

/// Render a scalar JSON value as spec text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => EMPTY_VALUE.to_string(),
        other => other.to_string(),
    }
}

/// Split `"Label: value"` on the first colon. Unlabelled items are numbered.
fn entry_from_item(index: usize, item: &Value) -> SpecEntry {
    let text = value_text(item);
    let fallback_label = || format!("Item {}", index + 1);

    match text.split_once(':') {
        Some((label, value)) => {
            let label = label.trim();
            let value = value.trim();
            SpecEntry {
                label: if label.is_empty() {
                    fallback_label()
                } else {
                    label.to_string()
                },
                value: if value.is_empty() {
                    EMPTY_VALUE.to_string()
                } else {
                    value.to_string()
                },
            }
        }
        None => SpecEntry {
            label: fallback_label(),
            value: text,
        },
    }
}

impl From<Value> for Specs {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(text) => Self::FreeText(text.trim().to_string()),
            Value::Array(items) => Self::KeyValueList(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| entry_from_item(i, item))
                    .collect(),
            ),
            Value::Object(map) => Self::KeyValueList(
                map.iter()
                    .map(|(label, value)| SpecEntry::new(label.clone(), value_text(value)))
                    .collect(),
            ),
            scalar => Self::FreeText(scalar.to_string()),
        }
    }
}

impl From<Specs> for Value {
    fn from(specs: Specs) -> Self {
        match specs {
            Specs::KeyValueList(entries) => {
                let map: Map<String, Self> = entries
                    .into_iter()
                    .map(|e| (e.label, Self::String(e.value)))
                    .collect();
                Self::Object(map)
            }
            Specs::FreeText(text) => Self::String(text),
        }
    }
}

// =============================================================================
// Spec templates
// =============================================================================

/// Product types with a default list of spec fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Laptop,
    MiniPc,
    Desktop,
    Printer,
    Processor,
    Memory,
    Monitor,
    SolidStateDrive,
    HardDiskDrive,
    PowerSupply,
    Motherboard,
    GraphicsCard,
    Case,
}

/// Category aliases (lowercase) mapped to product types.
const CATEGORY_ALIASES: &[(&str, ProductType)] = &[
    ("laptop", ProductType::Laptop),
    ("laptops", ProductType::Laptop),
    ("notebook", ProductType::Laptop),
    ("mini pc", ProductType::MiniPc),
    ("pc", ProductType::Desktop),
    ("desktop", ProductType::Desktop),
    ("cpus armados", ProductType::Desktop),
    ("printer", ProductType::Printer),
    ("impresora", ProductType::Printer),
    ("impresoras", ProductType::Printer),
    ("processor", ProductType::Processor),
    ("procesador", ProductType::Processor),
    ("procesadores", ProductType::Processor),
    ("cpu", ProductType::Processor),
    ("ram", ProductType::Memory),
    ("memory", ProductType::Memory),
    ("memoria", ProductType::Memory),
    ("memoria ram", ProductType::Memory),
    ("monitor", ProductType::Monitor),
    ("monitores", ProductType::Monitor),
    ("ssd", ProductType::SolidStateDrive),
    ("disco ssd", ProductType::SolidStateDrive),
    ("disco sólido", ProductType::SolidStateDrive),
    ("hdd", ProductType::HardDiskDrive),
    ("disco hdd", ProductType::HardDiskDrive),
    ("disco mecánico", ProductType::HardDiskDrive),
    ("power supply", ProductType::PowerSupply),
    ("psu", ProductType::PowerSupply),
    ("fuente", ProductType::PowerSupply),
    ("fuente de poder", ProductType::PowerSupply),
    ("motherboard", ProductType::Motherboard),
    ("placa", ProductType::Motherboard),
    ("placas", ProductType::Motherboard),
    ("placa madre", ProductType::Motherboard),
    ("graphics card", ProductType::GraphicsCard),
    ("gpu", ProductType::GraphicsCard),
    ("tarjeta gráfica", ProductType::GraphicsCard),
    ("tarjeta grafica", ProductType::GraphicsCard),
    ("tarjeta de video", ProductType::GraphicsCard),
    ("case", ProductType::Case),
    ("chasis", ProductType::Case),
    ("gabinete", ProductType::Case),
    ("caja", ProductType::Case),
];

impl ProductType {
    /// Resolve a single category name (case-insensitive, synonyms allowed).
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        let needle = category.trim().to_lowercase();
        CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, product_type)| *product_type)
    }

    /// Detect the product type from the first category that resolves.
    #[must_use]
    pub fn detect<S: AsRef<str>>(categories: &[S]) -> Option<Self> {
        categories
            .iter()
            .find_map(|category| Self::from_category(category.as_ref()))
    }

    /// Default spec fields for this product type.
    #[must_use]
    pub const fn spec_fields(self) -> &'static [&'static str] {
        match self {
            Self::Laptop => &[
                "Processor",
                "Display",
                "RAM",
                "Storage",
                "Graphics",
                "Connectivity",
                "OS",
                "Weight",
                "Battery",
            ],
            Self::MiniPc | Self::Desktop => &[
                "Processor",
                "RAM",
                "Storage",
                "Graphics",
                "Connectivity",
                "OS",
                "Power supply",
                "Weight",
            ],
            Self::Printer => &[
                "WiFi",
                "Print quality",
                "Model",
                "Compatible with",
                "Connectivity",
                "Paper format",
                "Printer type",
                "Sheet capacity",
                "Input",
                "Scanner resolution",
                "Black print speed",
                "Color print speed",
                "Print technology",
            ],
            Self::Processor => &[
                "Brand",
                "Model",
                "Cores",
                "Threads",
                "Base clock",
                "Boost clock",
                "Socket",
                "TDP",
            ],
            Self::Memory => &[
                "Capacity (GB)",
                "Type (DDR3/DDR4/DDR5)",
                "Speed (MHz)",
                "Latency",
                "Voltage",
                "Brand",
                "Compatibility",
            ],
            Self::Monitor => &[
                "Screen size",
                "Resolution",
                "Panel type",
                "Refresh rate",
                "Response time",
                "Brightness",
                "Connectivity",
                "Height adjustable",
                "Curvature",
                "Color gamut",
            ],
            Self::SolidStateDrive => &[
                "Capacity",
                "Interface (SATA/NVMe/M.2)",
                "Read speed",
                "Write speed",
                "Form factor",
                "MTBF",
            ],
            Self::HardDiskDrive => &[
                "Capacity",
                "Interface (SATA/NVMe/M.2)",
                "Read speed",
                "Write speed",
                "Form factor",
                "MTBF",
                "RPM",
            ],
            Self::PowerSupply => &[
                "Watts",
                "Efficiency (80+)",
                "Form factor (ATX/SFX)",
                "Certification",
                "Fans",
                "Connectors",
                "Protections",
            ],
            Self::Motherboard => &[
                "Socket",
                "Chipset",
                "Form factor (ATX/Micro-ATX/Mini-ITX)",
                "RAM slots",
                "Supported RAM speed",
                "Wireless",
                "Ports (USB/SATA/M.2)",
                "Audio",
                "Power phases",
            ],
            Self::GraphicsCard => &[
                "Brand",
                "Model",
                "VRAM",
                "VRAM type",
                "Bus width",
                "Connectivity",
                "Power draw",
                "Cooling",
            ],
            Self::Case => &[
                "Form factor",
                "Material",
                "Drive bays",
                "Included fans",
                "Max PSU length",
                "Dimensions",
                "Weight",
                "Front panel",
            ],
        }
    }
}
