use serde::{Deserialize, Serialize};

use super::Record;

/// Canonical inventory record produced by the import reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub batch: String,
    pub hsn: String,
    pub manufacturer: String,
    pub mrp: f64,
    pub purchase_rate: f64,
    pub sale_rate: f64,
    pub stock: f64,
    pub gst_rate: f64,
    /// `YYYY-MM-DD` when it came from a serial date, otherwise the cell text.
    pub expiry: String,
}

impl From<Product> for Record {
    fn from(p: Product) -> Self {
        Self::new()
            .with_field(ProductField::Name.as_str(), p.name)
            .with_field(ProductField::Batch.as_str(), p.batch)
            .with_field(ProductField::Hsn.as_str(), p.hsn)
            .with_field(ProductField::Manufacturer.as_str(), p.manufacturer)
            .with_field(ProductField::Mrp.as_str(), p.mrp)
            .with_field(ProductField::PurchaseRate.as_str(), p.purchase_rate)
            .with_field(ProductField::SaleRate.as_str(), p.sale_rate)
            .with_field(ProductField::Stock.as_str(), p.stock)
            .with_field(ProductField::GstRate.as_str(), p.gst_rate)
            .with_field(ProductField::Expiry.as_str(), p.expiry)
    }
}

/// Canonical product field names, as they appear in stored records and in
/// the synonym dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Name,
    Batch,
    Expiry,
    Hsn,
    Mrp,
    PurchaseRate,
    SaleRate,
    Stock,
    GstRate,
    Manufacturer,
}

impl ProductField {
    pub const ALL: [Self; 10] = [
        Self::Name,
        Self::Batch,
        Self::Expiry,
        Self::Hsn,
        Self::Mrp,
        Self::PurchaseRate,
        Self::SaleRate,
        Self::Stock,
        Self::GstRate,
        Self::Manufacturer,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Batch => "batch",
            Self::Expiry => "expiry",
            Self::Hsn => "hsn",
            Self::Mrp => "mrp",
            Self::PurchaseRate => "purchaseRate",
            Self::SaleRate => "saleRate",
            Self::Stock => "stock",
            Self::GstRate => "gstRate",
            Self::Manufacturer => "manufacturer",
        }
    }
}
