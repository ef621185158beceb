// src/models.rs
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use tokio_util::bytes::Bytes;
use validator::{Validate, ValidationError};

use crate::errors::AppError;

/// Nazwy pól formularza dokładnie tak, jak oczekuje ich API produktów.
/// Kolejność wariantów = kolejność części tekstowych w żądaniu multipart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum FieldName {
    Name,
    InventoryLocation,
    ModelCode,
    Year,
    Transmission,
    Color,
    Drive,
    Doors,
    Steering,
    Seats,
    EngineType,
    BodyType,
    EngineSize,
    Mileage,
    FuelType,
    ChassisNo,
    Description,
}

impl FieldName {
    /// Etykieta wyświetlana w formularzu.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Name => "Car Name",
            FieldName::InventoryLocation => "Inventory Location",
            FieldName::ModelCode => "Model",
            FieldName::Year => "Year",
            FieldName::Transmission => "Transmission",
            FieldName::Color => "Color",
            FieldName::Drive => "Drive",
            FieldName::Doors => "Doors",
            FieldName::Steering => "Steering",
            FieldName::Seats => "Seats",
            FieldName::EngineType => "Engine Type",
            FieldName::BodyType => "Body Type",
            FieldName::EngineSize => "Engine Size",
            FieldName::Mileage => "Mileage",
            FieldName::FuelType => "Fuel Type",
            FieldName::ChassisNo => "Chassis No",
            FieldName::Description => "Car Features",
        }
    }

    /// Pole struktury `FormFields` (snake_case, np. z `ValidationErrors`) -> nazwa pola.
    pub fn from_struct_field(ident: &str) -> Option<FieldName> {
        let camel: String = ident
            .split('_')
            .enumerate()
            .map(|(i, part)| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) if i > 0 => first.to_uppercase().chain(chars).collect(),
                    _ => part.to_string(),
                }
            })
            .collect();
        camel.parse().ok()
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, FieldName::ChassisNo)
    }

    /// Opcje dla pól typu `select`, `None` dla zwykłych inputów.
    pub fn options(&self) -> Option<(&'static str, Vec<String>)> {
        fn all<T: IntoEnumIterator + ToString>() -> Vec<String> {
            T::iter().map(|v| v.to_string()).collect()
        }
        match self {
            FieldName::Transmission => Some(("Select Transmission", all::<Transmission>())),
            FieldName::Drive => Some(("Select Drive Type", all::<Drive>())),
            FieldName::Steering => Some(("Select Steering Type", all::<Steering>())),
            FieldName::FuelType => Some(("Select Fuel Type", all::<FuelType>())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
pub enum Transmission {
    #[strum(serialize = "AT (Automatic)")]
    Automatic,
    #[strum(serialize = "MT (Manual)")]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
pub enum Drive {
    #[strum(serialize = "2WD")]
    TwoWheel,
    #[strum(serialize = "4WD")]
    FourWheel,
    #[strum(serialize = "AWD")]
    AllWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
pub enum Steering {
    #[strum(serialize = "LHD (Left-Hand Drive)")]
    LeftHand,
    #[strum(serialize = "RHD (Right-Hand Drive)")]
    RightHand,
}

fn validate_seats(value: &str) -> Result<(), ValidationError> {
    if value.trim().parse::<u32>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("seats_not_numeric").with_message("must be a number".into()))
    }
}

fn validate_option<T: std::str::FromStr>(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown_option").with_message("pick an option".into()))
}

fn validate_transmission(value: &str) -> Result<(), ValidationError> {
    validate_option::<Transmission>(value)
}

fn validate_drive(value: &str) -> Result<(), ValidationError> {
    validate_option::<Drive>(value)
}

fn validate_steering(value: &str) -> Result<(), ValidationError> {
    validate_option::<Steering>(value)
}

fn validate_fuel_type(value: &str) -> Result<(), ValidationError> {
    validate_option::<FuelType>(value)
}

/// Skalarne pola formularza "Add product". Pole pochodne `images` trzyma
/// formularz stagingu, bo jest projekcją listy załączników.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct FormFields {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub inventory_location: String,
    #[validate(length(min = 1, message = "is required"))]
    pub model_code: String,
    #[validate(length(min = 1, message = "is required"))]
    pub year: String,
    #[validate(custom(function = "validate_transmission"))]
    pub transmission: String,
    #[validate(length(min = 1, message = "is required"))]
    pub color: String,
    #[validate(custom(function = "validate_drive"))]
    pub drive: String,
    #[validate(length(min = 1, message = "is required"))]
    pub doors: String,
    #[validate(custom(function = "validate_steering"))]
    pub steering: String,
    #[validate(custom(function = "validate_seats"))]
    pub seats: String,
    #[validate(length(min = 1, message = "is required"))]
    pub engine_type: String,
    #[validate(length(min = 1, message = "is required"))]
    pub body_type: String,
    #[validate(length(min = 1, message = "is required"))]
    pub engine_size: String,
    #[validate(length(min = 1, message = "is required"))]
    pub mileage: String,
    #[validate(custom(function = "validate_fuel_type"))]
    pub fuel_type: String,
    pub chassis_no: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
}

impl FormFields {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.name,
            FieldName::InventoryLocation => &self.inventory_location,
            FieldName::ModelCode => &self.model_code,
            FieldName::Year => &self.year,
            FieldName::Transmission => &self.transmission,
            FieldName::Color => &self.color,
            FieldName::Drive => &self.drive,
            FieldName::Doors => &self.doors,
            FieldName::Steering => &self.steering,
            FieldName::Seats => &self.seats,
            FieldName::EngineType => &self.engine_type,
            FieldName::BodyType => &self.body_type,
            FieldName::EngineSize => &self.engine_size,
            FieldName::Mileage => &self.mileage,
            FieldName::FuelType => &self.fuel_type,
            FieldName::ChassisNo => &self.chassis_no,
            FieldName::Description => &self.description,
        }
    }

    fn slot_mut(&mut self, field: FieldName) -> &mut String {
        match field {
            FieldName::Name => &mut self.name,
            FieldName::InventoryLocation => &mut self.inventory_location,
            FieldName::ModelCode => &mut self.model_code,
            FieldName::Year => &mut self.year,
            FieldName::Transmission => &mut self.transmission,
            FieldName::Color => &mut self.color,
            FieldName::Drive => &mut self.drive,
            FieldName::Doors => &mut self.doors,
            FieldName::Steering => &mut self.steering,
            FieldName::Seats => &mut self.seats,
            FieldName::EngineType => &mut self.engine_type,
            FieldName::BodyType => &mut self.body_type,
            FieldName::EngineSize => &mut self.engine_size,
            FieldName::Mileage => &mut self.mileage,
            FieldName::FuelType => &mut self.fuel_type,
            FieldName::ChassisNo => &mut self.chassis_no,
            FieldName::Description => &mut self.description,
        }
    }

    pub fn set(&mut self, field: FieldName, value: String) {
        *self.slot_mut(field) = value;
    }

    /// Ustawia pole po nazwie z formularza (np. `engineSize`).
    pub fn set_by_name(&mut self, name: &str, value: String) -> Result<FieldName, AppError> {
        let field = name
            .parse::<FieldName>()
            .map_err(|_| AppError::UnprocessableEntity(format!("Unknown form field '{}'", name)))?;
        self.set(field, value);
        Ok(field)
    }

    /// Wszystkie pola jako pary (nazwa, wartość) w kolejności wysyłki.
    pub fn text_parts(&self) -> Vec<(&'static str, String)> {
        FieldName::iter()
            .map(|field| (field.into(), self.get(field).to_string()))
            .collect()
    }
}

/// Surowy plik obrazu przyjęty od przeglądarki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl StagedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn filled_fields() -> FormFields {
        FormFields {
            name: "Toyota Land Cruiser".to_string(),
            inventory_location: "Yokohama".to_string(),
            model_code: "GDJ150W".to_string(),
            year: "2019".to_string(),
            transmission: Transmission::Automatic.to_string(),
            color: "Pearl White".to_string(),
            drive: Drive::FourWheel.to_string(),
            doors: "5".to_string(),
            steering: Steering::RightHand.to_string(),
            seats: "7".to_string(),
            engine_type: "1GD-FTV".to_string(),
            body_type: "SUV".to_string(),
            engine_size: "2800cc".to_string(),
            mileage: "54000".to_string(),
            fuel_type: FuelType::Diesel.to_string(),
            chassis_no: String::new(),
            description: "Sunroof, leather seats".to_string(),
        }
    }

    #[test]
    fn field_names_match_api_keys() {
        let names: Vec<&'static str> = FieldName::iter().map(Into::into).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "inventoryLocation",
                "modelCode",
                "year",
                "transmission",
                "color",
                "drive",
                "doors",
                "steering",
                "seats",
                "engineType",
                "bodyType",
                "engineSize",
                "mileage",
                "fuelType",
                "chassisNo",
                "description",
            ]
        );
    }

    #[test]
    fn set_by_name_merges_single_value() {
        let mut fields = FormFields::default();
        let field = fields
            .set_by_name("engineSize", "1500cc".to_string())
            .unwrap();
        assert_eq!(field, FieldName::EngineSize);
        assert_eq!(fields.engine_size, "1500cc");
        assert_eq!(fields.name, "");
    }

    #[test]
    fn set_by_name_rejects_unknown_key() {
        let mut fields = FormFields::default();
        let err = fields.set_by_name("images", "x".to_string()).unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert_eq!(fields, FormFields::default());
    }

    #[test]
    fn filled_form_passes_validation() {
        assert!(filled_fields().validate().is_ok());
    }

    #[test]
    fn seats_must_be_numeric() {
        let mut fields = filled_fields();
        fields.seats = "seven".to_string();
        let errors = fields.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("seats"));
    }

    #[test]
    fn select_values_come_from_option_sets() {
        let mut fields = filled_fields();
        fields.fuel_type = "Steam".to_string();
        fields.name = String::new();
        let errors = fields.validate().unwrap_err();
        let keys = errors.field_errors();
        assert!(keys.contains_key("fuel_type"));
        assert!(keys.contains_key("name"));
        assert!(!keys.contains_key("chassis_no"));
    }

    #[test]
    fn struct_fields_map_to_wire_names() {
        assert_eq!(
            FieldName::from_struct_field("fuel_type"),
            Some(FieldName::FuelType)
        );
        assert_eq!(
            FieldName::from_struct_field("inventory_location"),
            Some(FieldName::InventoryLocation)
        );
        assert_eq!(FieldName::from_struct_field("name"), Some(FieldName::Name));
        assert_eq!(FieldName::from_struct_field("images"), None);
    }

    #[test]
    fn option_labels_round_trip_through_strum() {
        let (placeholder, options) = FieldName::Steering.options().unwrap();
        assert_eq!(placeholder, "Select Steering Type");
        assert_eq!(
            options,
            vec!["LHD (Left-Hand Drive)", "RHD (Right-Hand Drive)"]
        );
        assert_eq!("2WD".parse::<Drive>().unwrap(), Drive::TwoWheel);
        assert!(FieldName::Color.options().is_none());
    }
}
