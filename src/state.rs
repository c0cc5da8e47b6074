//! Session store
//!
//! All editor state lives in [`Session`] and only changes through
//! [`Session::apply`]. The reducer never performs I/O: when an action needs
//! the pricing API it returns an [`Effect`] carrying a ticket, and the
//! driver feeds the outcome back as another action. Configuration tickets
//! carry the line item's generation, value-list and estimate tickets its
//! committed revision, so that late answers to a superseded request are
//! dropped instead of overwriting newer state.

use crate::catalog::LOCATION_ATTRIBUTE;
use crate::error::EstimatorError;
use crate::models::{EstimateRequest, EstimateResponse};
use crate::region::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque line item identity, generated when the item is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 hex digits, enough to tell items apart on screen
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a configuration attribute is edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "values")]
pub enum AttributeInput {
    /// One of the values the pricing API enumerated
    Choices(Vec<String>),
    /// No value list available
    FreeText,
}

impl AttributeInput {
    pub fn from_values(values: Vec<String>) -> Self {
        if values.is_empty() {
            Self::FreeText
        } else {
            Self::Choices(values)
        }
    }
}

/// Which request a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Services,
    Configuration,
    AttributeValues,
    Estimate,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Services => write!(f, "service list"),
            Self::Configuration => write!(f, "configuration"),
            Self::AttributeValues => write!(f, "attribute values"),
            Self::Estimate => write!(f, "estimate"),
        }
    }
}

/// Last failed request of a line item, kept for the UI to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub stage: FailureStage,
    pub kind: String,
    pub reason: String,
}

impl Failure {
    pub fn new(stage: FailureStage, error: &EstimatorError) -> Self {
        Self {
            stage,
            kind: error.kind().to_string(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.reason)
    }
}

/// Where a line item is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    Loading,
    Configured,
    Estimated,
}

/// One hypothetical cloud resource
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub service: Option<String>,
    /// Service requested by the configuration fetch in flight
    pub pending_service: Option<String>,
    /// Allow-listed attributes, in the service's order
    pub attributes: Vec<String>,
    /// Full attribute list, shown in the advanced view
    pub all_attributes: Vec<String>,
    pub value_options: BTreeMap<String, AttributeInput>,
    pub selections: BTreeMap<String, String>,
    pub quantity: u32,
    pub estimated_cost: f64,
    pub unit_price: Option<f64>,
    pub unit_type: Option<String>,
    pub estimated_at: Option<DateTime<Utc>>,
    /// Configuration changed since the stored estimate was computed
    pub estimate_stale: bool,
    pub loading: bool,
    pub advanced: bool,
    /// Bumped on every service selection
    pub generation: u64,
    /// Bumped when a configuration is committed
    pub revision: u64,
    pub last_failure: Option<Failure>,
}

impl LineItem {
    pub fn new(id: LineItemId) -> Self {
        Self {
            id,
            service: None,
            pending_service: None,
            attributes: Vec::new(),
            all_attributes: Vec::new(),
            value_options: BTreeMap::new(),
            selections: BTreeMap::new(),
            quantity: 1,
            estimated_cost: 0.0,
            unit_price: None,
            unit_type: None,
            estimated_at: None,
            estimate_stale: false,
            loading: false,
            advanced: false,
            generation: 0,
            revision: 0,
            last_failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.service.is_none() {
            Phase::Empty
        } else if self.estimated_at.is_some() && !self.estimate_stale {
            Phase::Estimated
        } else {
            Phase::Configured
        }
    }

    /// Whether `attribute` may appear as a selection key
    pub fn accepts_selection(&self, attribute: &str) -> bool {
        attribute == LOCATION_ATTRIBUTE
            || self.attributes.iter().any(|a| a == attribute)
            || self.all_attributes.iter().any(|a| a == attribute)
    }

    /// Attributes listed in the current view mode
    pub fn visible_attributes(&self) -> &[String] {
        if self.advanced {
            &self.all_attributes
        } else {
            &self.attributes
        }
    }

    /// Selections with `location` forced to the region's display name
    pub fn selections_for(&self, region: Region) -> BTreeMap<String, String> {
        let mut merged = self.selections.clone();
        merged.insert(
            LOCATION_ATTRIBUTE.to_string(),
            region.display_name().to_string(),
        );
        merged
    }
}

/// Services offered by the pricing API
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceCatalog {
    pub services: Vec<String>,
    pub loading: bool,
    pub failure: Option<Failure>,
}

/// Result of a configuration fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub all_attributes: Vec<String>,
    pub attributes: Vec<String>,
    pub value_options: BTreeMap<String, AttributeInput>,
}

/// Request to configure a line item for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationTicket {
    pub id: LineItemId,
    pub generation: u64,
    pub service: String,
}

/// Request for the value list of a single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValuesTicket {
    pub id: LineItemId,
    pub revision: u64,
    pub service: String,
    pub attribute: String,
}

/// Request for one line item's estimate
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateTicket {
    pub id: LineItemId,
    pub revision: u64,
    pub request: EstimateRequest,
}

pub enum Action {
    SetAccount(String),
    SetRegion(Region),
    LoadServices,
    ServicesLoaded(Result<Vec<String>, EstimatorError>),
    AddItem(LineItemId),
    RemoveItem(LineItemId),
    SelectService {
        id: LineItemId,
        service: String,
    },
    ConfigurationLoaded {
        ticket: ConfigurationTicket,
        result: Result<Configuration, EstimatorError>,
    },
    UpdateSelection {
        id: LineItemId,
        attribute: String,
        value: String,
    },
    SetQuantity {
        id: LineItemId,
        quantity: u32,
    },
    ToggleAdvanced(LineItemId),
    LoadAttributeValues {
        id: LineItemId,
        attribute: String,
    },
    AttributeValuesLoaded {
        ticket: AttributeValuesTicket,
        result: Result<Vec<String>, EstimatorError>,
    },
    RecomputeEstimates,
    EstimateLoaded {
        ticket: EstimateTicket,
        result: Result<EstimateResponse, EstimatorError>,
    },
    EstimatesFinished,
}

/// What the driver has to do after an action was applied
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// State was updated, nothing to fetch
    Updated,
    /// Action did not apply (unknown item, invalid input, no-op)
    Ignored,
    /// Response belonged to a superseded request and was dropped
    Discarded,
    /// A request failed; the failure is recorded in the session
    Failed,
    FetchServices,
    FetchConfiguration(ConfigurationTicket),
    FetchAttributeValues(AttributeValuesTicket),
    FetchEstimates(Vec<EstimateTicket>),
}

/// Editor state for one page session
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    pub account_id: String,
    pub region: Region,
    pub items: Vec<LineItem>,
    pub catalog: ServiceCatalog,
    pub estimating: bool,
}

impl Session {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    pub fn item(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: LineItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Sum of every line item's stored estimate
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.estimated_cost).sum()
    }

    pub fn apply(&mut self, action: Action) -> Effect {
        match action {
            Action::SetAccount(account_id) => {
                self.account_id = account_id.trim().to_string();
                Effect::Updated
            }
            Action::SetRegion(region) => {
                if self.region == region {
                    return Effect::Ignored;
                }
                self.region = region;
                for item in self.items.iter_mut().filter(|i| i.estimated_at.is_some()) {
                    item.estimate_stale = true;
                }
                Effect::Updated
            }
            Action::LoadServices => {
                self.catalog.loading = true;
                self.catalog.failure = None;
                Effect::FetchServices
            }
            Action::ServicesLoaded(result) => {
                self.catalog.loading = false;
                match result {
                    Ok(services) => {
                        self.catalog.services = services;
                        Effect::Updated
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load service list");
                        self.catalog.services.clear();
                        self.catalog.failure = Some(Failure::new(FailureStage::Services, &e));
                        Effect::Failed
                    }
                }
            }
            Action::AddItem(id) => {
                if self.item(id).is_some() {
                    return Effect::Ignored;
                }
                self.items.push(LineItem::new(id));
                Effect::Updated
            }
            Action::RemoveItem(id) => {
                let before = self.items.len();
                self.items.retain(|item| item.id != id);
                if self.items.len() == before {
                    Effect::Ignored
                } else {
                    Effect::Updated
                }
            }
            Action::SelectService { id, service } => self.select_service(id, service),
            Action::ConfigurationLoaded { ticket, result } => {
                self.configuration_loaded(ticket, result)
            }
            Action::UpdateSelection {
                id,
                attribute,
                value,
            } => self.update_selection(id, attribute, value),
            Action::SetQuantity { id, quantity } => {
                if quantity == 0 {
                    return Effect::Ignored;
                }
                let Some(item) = self.item_mut(id) else {
                    return Effect::Ignored;
                };
                if item.quantity != quantity {
                    item.quantity = quantity;
                    item.estimate_stale = item.estimated_at.is_some();
                }
                Effect::Updated
            }
            Action::ToggleAdvanced(id) => {
                let Some(item) = self.item_mut(id) else {
                    return Effect::Ignored;
                };
                item.advanced = !item.advanced;
                Effect::Updated
            }
            Action::LoadAttributeValues { id, attribute } => {
                let Some(item) = self.item(id) else {
                    return Effect::Ignored;
                };
                let Some(service) = item.service.clone() else {
                    return Effect::Ignored;
                };
                if item.loading || !item.all_attributes.contains(&attribute) {
                    return Effect::Ignored;
                }
                Effect::FetchAttributeValues(AttributeValuesTicket {
                    id,
                    revision: item.revision,
                    service,
                    attribute,
                })
            }
            Action::AttributeValuesLoaded { ticket, result } => {
                let Some(item) = self.item_mut(ticket.id) else {
                    return Effect::Discarded;
                };
                if item.revision != ticket.revision {
                    debug!(item = %ticket.id, "Discarding stale attribute values");
                    return Effect::Discarded;
                }
                match result {
                    Ok(values) => {
                        item.value_options
                            .insert(ticket.attribute, AttributeInput::from_values(values));
                        Effect::Updated
                    }
                    Err(e) => {
                        warn!(item = %ticket.id, attribute = %ticket.attribute, error = %e, "Failed to load attribute values");
                        item.last_failure = Some(Failure::new(FailureStage::AttributeValues, &e));
                        Effect::Failed
                    }
                }
            }
            Action::RecomputeEstimates => {
                let region = self.region;
                let tickets: Vec<EstimateTicket> = self
                    .items
                    .iter()
                    .filter_map(|item| {
                        let service = item.service.clone()?;
                        Some(EstimateTicket {
                            id: item.id,
                            revision: item.revision,
                            request: EstimateRequest {
                                service,
                                selections: item.selections_for(region),
                                quantity: item.quantity,
                            },
                        })
                    })
                    .collect();

                if tickets.is_empty() {
                    return Effect::Ignored;
                }
                self.estimating = true;
                Effect::FetchEstimates(tickets)
            }
            Action::EstimateLoaded { ticket, result } => self.estimate_loaded(ticket, result),
            Action::EstimatesFinished => {
                self.estimating = false;
                Effect::Updated
            }
        }
    }

    fn select_service(&mut self, id: LineItemId, service: String) -> Effect {
        let service = service.trim();
        if service.is_empty() {
            return Effect::Ignored;
        }
        let Some(item) = self.item_mut(id) else {
            return Effect::Ignored;
        };

        item.generation += 1;
        item.loading = true;
        item.pending_service = Some(service.to_string());

        Effect::FetchConfiguration(ConfigurationTicket {
            id,
            generation: item.generation,
            service: service.to_string(),
        })
    }

    fn configuration_loaded(
        &mut self,
        ticket: ConfigurationTicket,
        result: Result<Configuration, EstimatorError>,
    ) -> Effect {
        let location = self.region.display_name();
        let Some(item) = self.item_mut(ticket.id) else {
            debug!(item = %ticket.id, "Configuration arrived for removed item");
            return Effect::Discarded;
        };
        if item.generation != ticket.generation {
            warn!(
                item = %ticket.id,
                service = %ticket.service,
                ticket_generation = ticket.generation,
                current_generation = item.generation,
                "Discarding stale configuration"
            );
            return Effect::Discarded;
        }

        item.loading = false;
        item.pending_service = None;

        match result {
            Ok(configuration) => {
                item.revision += 1;
                item.service = Some(ticket.service);
                item.attributes = configuration.attributes;
                item.all_attributes = configuration.all_attributes;
                item.value_options = configuration.value_options;
                item.selections.clear();
                item.selections
                    .insert(LOCATION_ATTRIBUTE.to_string(), location.to_string());
                item.estimate_stale = item.estimated_at.is_some();
                item.last_failure = None;
                Effect::Updated
            }
            Err(e) => {
                warn!(item = %ticket.id, service = %ticket.service, error = %e, "Failed to configure line item");
                item.last_failure = Some(Failure::new(FailureStage::Configuration, &e));
                Effect::Failed
            }
        }
    }

    fn update_selection(&mut self, id: LineItemId, attribute: String, value: String) -> Effect {
        let Some(item) = self.item_mut(id) else {
            return Effect::Ignored;
        };
        // location always follows the session region
        if attribute == LOCATION_ATTRIBUTE || !item.accepts_selection(&attribute) {
            return Effect::Ignored;
        }

        let value = value.trim();
        let changed = if value.is_empty() {
            item.selections.remove(&attribute).is_some()
        } else {
            item.selections.insert(attribute, value.to_string()).as_deref() != Some(value)
        };
        if changed {
            item.estimate_stale = item.estimated_at.is_some();
        }
        Effect::Updated
    }

    fn estimate_loaded(
        &mut self,
        ticket: EstimateTicket,
        result: Result<EstimateResponse, EstimatorError>,
    ) -> Effect {
        let Some(item) = self.item_mut(ticket.id) else {
            return Effect::Discarded;
        };
        if item.revision != ticket.revision {
            debug!(item = %ticket.id, "Discarding estimate for reconfigured item");
            return Effect::Discarded;
        }

        let result = result.and_then(|response| match response.failure() {
            Some(reason) => Err(EstimatorError::Pricing(reason.to_string())),
            None => Ok(response),
        });

        match result {
            Ok(response) => {
                item.estimated_cost = response.monthly_estimate_or_zero();
                item.unit_price = response.unit_price;
                item.unit_type = response.unit_type;
                item.estimated_at = Some(Utc::now());
                item.estimate_stale = false;
                item.last_failure = None;
                Effect::Updated
            }
            Err(e) => {
                warn!(item = %ticket.id, service = %ticket.request.service, error = %e, "Estimate request failed");
                item.last_failure = Some(Failure::new(FailureStage::Estimate, &e));
                Effect::Failed
            }
        }
    }
}
