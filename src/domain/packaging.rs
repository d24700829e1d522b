//! Boxes, pallets and the capability they share.
//!
//! Both item kinds validate their attributes on construction and compute
//! weight, volume and expiry on demand. Derived numbers go through
//! [`check_overflow`] so that extreme magnitudes surface as
//! [`PackagingError::Overflow`] rather than as `inf`/`NaN`.

use crate::domain::error::{PackagingError, PackagingResult};
use crate::domain::model::{RawBox, RawPallet};
use chrono::{NaiveDateTime, TimeDelta};

/// Days between production and expiry of a box.
pub const EXPIRATION_OFFSET_DAYS: i64 = 100;

/// Weight the empty pallet contributes on its own.
pub const PALLET_BASE_WEIGHT: f64 = 30.0;

pub fn expiration_offset() -> TimeDelta {
    TimeDelta::days(EXPIRATION_OFFSET_DAYS)
}

/// Rejects zero, negative and NaN values.
pub fn validate_positive(field: &str, value: f64) -> PackagingResult<f64> {
    if value.is_nan() {
        return Err(PackagingError::out_of_range(field, "value is not a number"));
    }
    if value <= 0.0 {
        return Err(PackagingError::out_of_range(
            field,
            format!("value must be greater than zero, got {}", value),
        ));
    }
    Ok(value)
}

/// Passes `value` through unless it is infinite or NaN.
pub fn check_overflow(value: f64, context: &str) -> PackagingResult<f64> {
    if value.is_infinite() || value.is_nan() {
        return Err(PackagingError::overflow(context));
    }
    Ok(value)
}

/// Width, height and depth of a physical item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    width: f64,
    height: f64,
    depth: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64, depth: f64) -> PackagingResult<Self> {
        Ok(Self {
            width: validate_positive("width", width)?,
            height: validate_positive("height", height)?,
            depth: validate_positive("depth", depth)?,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Raw `width * height * depth`, possibly infinite.
    fn raw_volume(&self) -> f64 {
        self.width * self.height * self.depth
    }

    /// Overflow-checked volume; `context` names the computation in errors.
    pub fn volume(&self, context: &str) -> PackagingResult<f64> {
        check_overflow(self.raw_volume(), context)
    }

    /// Whether this footprint (width x depth) fits inside `outer`, either as
    /// is or rotated by 90 degrees. Height is ignored.
    pub fn fits_footprint(&self, outer: &Dimensions) -> bool {
        let fits_normally = self.width <= outer.width && self.depth <= outer.depth;
        let fits_rotated = self.width <= outer.depth && self.depth <= outer.width;
        fits_normally || fits_rotated
    }
}

/// Capability shared by every dimensioned item.
pub trait Package {
    fn id(&self) -> Option<u32>;

    fn dimensions(&self) -> &Dimensions;

    fn weight(&self) -> PackagingResult<f64>;

    fn volume(&self) -> PackagingResult<f64>;

    fn expire_date(&self) -> PackagingResult<NaiveDateTime>;
}

/// A single box.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageBox {
    id: Option<u32>,
    dimensions: Dimensions,
    weight: f64,
    production_date: NaiveDateTime,
    expire_date: NaiveDateTime,
}

impl PackageBox {
    /// Builds a box, failing with [`PackagingError::OutOfRange`] if any
    /// dimension or the weight is not positive, or if the production date
    /// leaves no room for the expiration offset.
    pub fn new(
        width: f64,
        height: f64,
        depth: f64,
        weight: f64,
        production_date: NaiveDateTime,
    ) -> PackagingResult<Self> {
        let dimensions = Dimensions::new(width, height, depth)?;
        let weight = validate_positive("weight", weight)?;
        let expire_date = production_date
            .checked_add_signed(expiration_offset())
            .ok_or_else(|| {
                PackagingError::out_of_range(
                    "production_date",
                    "production date is too close to the maximum representable date",
                )
            })?;

        Ok(Self {
            id: None,
            dimensions,
            weight,
            production_date,
            expire_date,
        })
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn production_date(&self) -> NaiveDateTime {
        self.production_date
    }
}

impl Package for PackageBox {
    fn id(&self) -> Option<u32> {
        self.id
    }

    fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    fn weight(&self) -> PackagingResult<f64> {
        Ok(self.weight)
    }

    fn volume(&self) -> PackagingResult<f64> {
        self.dimensions.volume("box volume")
    }

    fn expire_date(&self) -> PackagingResult<NaiveDateTime> {
        Ok(self.expire_date)
    }
}

impl TryFrom<&RawBox> for PackageBox {
    type Error = PackagingError;

    fn try_from(raw: &RawBox) -> PackagingResult<Self> {
        Ok(PackageBox::new(
            raw.width,
            raw.height,
            raw.depth,
            raw.weight,
            raw.production_date,
        )?
        .with_id(raw.id))
    }
}

/// A pallet holding an ordered list of boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pallet {
    id: Option<u32>,
    dimensions: Dimensions,
    boxes: Vec<PackageBox>,
}

impl Pallet {
    pub fn new(width: f64, height: f64, depth: f64) -> PackagingResult<Self> {
        Ok(Self {
            id: None,
            dimensions: Dimensions::new(width, height, depth)?,
            boxes: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Appends `item` if its footprint fits the pallet in either orientation.
    /// On failure the pallet is left unchanged.
    pub fn add_box(&mut self, item: PackageBox) -> PackagingResult<()> {
        if !item.dimensions.fits_footprint(&self.dimensions) {
            return Err(PackagingError::invalid_state("box too large for pallet"));
        }

        self.boxes.push(item);
        Ok(())
    }

    /// Like [`Pallet::add_box`], for boxes that may be absent in the source.
    pub fn add_optional_box(&mut self, item: Option<PackageBox>) -> PackagingResult<()> {
        match item {
            Some(item) => self.add_box(item),
            None => Err(PackagingError::null_argument("box")),
        }
    }

    /// Boxes in insertion order.
    pub fn boxes(&self) -> &[PackageBox] {
        &self.boxes
    }
}

impl Package for Pallet {
    fn id(&self) -> Option<u32> {
        self.id
    }

    fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    fn weight(&self) -> PackagingResult<f64> {
        let boxes: f64 = self
            .boxes
            .iter()
            .map(Package::weight)
            .sum::<PackagingResult<f64>>()?;
        check_overflow(boxes + PALLET_BASE_WEIGHT, "pallet weight")
    }

    fn volume(&self) -> PackagingResult<f64> {
        let boxes: f64 = self
            .boxes
            .iter()
            .map(Package::volume)
            .sum::<PackagingResult<f64>>()?;
        check_overflow(boxes + self.dimensions.raw_volume(), "pallet volume")
    }

    fn expire_date(&self) -> PackagingResult<NaiveDateTime> {
        self.boxes
            .iter()
            .map(|b| b.expire_date)
            .min()
            .ok_or_else(|| PackagingError::invalid_state("no boxes available"))
    }
}

impl TryFrom<&RawPallet> for Pallet {
    type Error = PackagingError;

    /// Builds the empty pallet; boxes are added separately.
    fn try_from(raw: &RawPallet) -> PackagingResult<Self> {
        Ok(Pallet::new(raw.width, raw.height, raw.depth)?.with_id(raw.id))
    }
}
