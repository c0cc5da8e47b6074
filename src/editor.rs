use crate::catalog::PriorityAttributes;
use crate::client::PricingApi;
use crate::error::EstimatorError;
use crate::models::EstimateResponse;
use crate::region::Region;
use crate::state::{
    Action, AttributeInput, Configuration, Effect, EstimateTicket, Failure, LineItemId, Session,
};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Result of an editor operation, as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed
    Applied,
    /// Nothing to do (unknown item, empty input, ...)
    Ignored,
    /// The answer arrived for a superseded request and was dropped
    Discarded,
    /// The request failed; the item keeps its previous state
    Failed(Failure),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Per-item results of a recompute
#[derive(Debug, Clone, Default)]
pub struct EstimateReport {
    pub results: Vec<(LineItemId, Outcome)>,
    pub total: f64,
}

impl EstimateReport {
    pub fn failures(&self) -> impl Iterator<Item = (&LineItemId, &Failure)> {
        self.results.iter().filter_map(|(id, outcome)| match outcome {
            Outcome::Failed(failure) => Some((id, failure)),
            _ => None,
        })
    }
}

/// Fetch everything needed to configure a line item for `service`.
///
/// The smart attributes' value lists are requested concurrently and the
/// result is only produced once all of them resolved. Any failed request
/// fails the whole configuration.
pub async fn fetch_configuration<P>(
    api: &P,
    priorities: &PriorityAttributes,
    service: &str,
) -> Result<Configuration, EstimatorError>
where
    P: PricingApi + ?Sized,
{
    let all_attributes = api.list_attributes(service).await?;
    let attributes = priorities.smart_attributes(&all_attributes);
    debug!(
        service = service,
        total = all_attributes.len(),
        smart = attributes.len(),
        "Fetched attribute list"
    );

    let lookups = attributes
        .iter()
        .map(|attribute| api.list_attribute_values(service, attribute));
    let values = join_all(lookups).await;

    let mut value_options = BTreeMap::new();
    for (attribute, result) in attributes.iter().zip(values) {
        value_options.insert(attribute.clone(), AttributeInput::from_values(result?));
    }

    Ok(Configuration {
        all_attributes,
        attributes,
        value_options,
    })
}

/// Issue every estimate request concurrently and wait for all of them
pub async fn fetch_estimates<P>(
    api: &P,
    tickets: Vec<EstimateTicket>,
) -> Vec<(EstimateTicket, Result<EstimateResponse, EstimatorError>)>
where
    P: PricingApi + ?Sized,
{
    let results = join_all(tickets.iter().map(|ticket| api.estimate(&ticket.request))).await;
    tickets.into_iter().zip(results).collect()
}

/// Resource list editor: owns the session and drives it against a pricing API
pub struct Editor<P> {
    api: P,
    priorities: PriorityAttributes,
    session: Session,
}

impl<P: PricingApi> Editor<P> {
    pub fn new(api: P, session: Session) -> Self {
        Self {
            api,
            priorities: PriorityAttributes::default(),
            session,
        }
    }

    pub fn with_priorities(mut self, priorities: PriorityAttributes) -> Self {
        self.priorities = priorities;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    pub fn total(&self) -> f64 {
        self.session.total()
    }

    pub fn set_account(&mut self, account_id: impl Into<String>) {
        self.session.apply(Action::SetAccount(account_id.into()));
    }

    pub fn set_region(&mut self, region: Region) -> bool {
        self.session.apply(Action::SetRegion(region)) == Effect::Updated
    }

    pub async fn load_services(&mut self) -> Outcome {
        if self.session.apply(Action::LoadServices) != Effect::FetchServices {
            return Outcome::Ignored;
        }
        let result = self.api.list_services().await;
        match self.session.apply(Action::ServicesLoaded(result)) {
            Effect::Updated => {
                info!(count = self.session.catalog.services.len(), "Loaded service list");
                Outcome::Applied
            }
            _ => match &self.session.catalog.failure {
                Some(failure) => Outcome::Failed(failure.clone()),
                None => Outcome::Ignored,
            },
        }
    }

    pub fn add_item(&mut self) -> LineItemId {
        let id = LineItemId::new();
        self.session.apply(Action::AddItem(id));
        id
    }

    pub fn remove_item(&mut self, id: LineItemId) -> bool {
        self.session.apply(Action::RemoveItem(id)) == Effect::Updated
    }

    pub async fn select_service(&mut self, id: LineItemId, service: &str) -> Outcome {
        let ticket = match self.session.apply(Action::SelectService {
            id,
            service: service.to_string(),
        }) {
            Effect::FetchConfiguration(ticket) => ticket,
            _ => return Outcome::Ignored,
        };

        let result = fetch_configuration(&self.api, &self.priorities, &ticket.service).await;
        let effect = self.session.apply(Action::ConfigurationLoaded { ticket, result });
        self.outcome_for(id, effect)
    }

    pub fn update_selection(&mut self, id: LineItemId, attribute: &str, value: &str) -> bool {
        self.session.apply(Action::UpdateSelection {
            id,
            attribute: attribute.to_string(),
            value: value.to_string(),
        }) == Effect::Updated
    }

    pub fn set_quantity(&mut self, id: LineItemId, quantity: u32) -> bool {
        self.session.apply(Action::SetQuantity { id, quantity }) == Effect::Updated
    }

    pub fn toggle_advanced(&mut self, id: LineItemId) -> bool {
        self.session.apply(Action::ToggleAdvanced(id)) == Effect::Updated
    }

    /// Lazily fetch the value list of one advanced-view attribute
    pub async fn load_attribute_values(&mut self, id: LineItemId, attribute: &str) -> Outcome {
        let ticket = match self.session.apply(Action::LoadAttributeValues {
            id,
            attribute: attribute.to_string(),
        }) {
            Effect::FetchAttributeValues(ticket) => ticket,
            _ => return Outcome::Ignored,
        };

        let result = self
            .api
            .list_attribute_values(&ticket.service, &ticket.attribute)
            .await;
        let effect = self.session.apply(Action::AttributeValuesLoaded { ticket, result });
        self.outcome_for(id, effect)
    }

    /// Recompute every configured item's estimate.
    ///
    /// `estimating` stays set until every request has finished.
    pub async fn recompute_estimates(&mut self) -> EstimateReport {
        let tickets = match self.session.apply(Action::RecomputeEstimates) {
            Effect::FetchEstimates(tickets) => tickets,
            _ => {
                return EstimateReport {
                    results: Vec::new(),
                    total: self.session.total(),
                }
            }
        };
        info!(items = tickets.len(), region = %self.session.region, "Recomputing estimates");

        let responses = fetch_estimates(&self.api, tickets).await;

        let mut results = Vec::with_capacity(responses.len());
        for (ticket, result) in responses {
            let id = ticket.id;
            let effect = self.session.apply(Action::EstimateLoaded { ticket, result });
            results.push((id, self.outcome_for(id, effect)));
        }
        self.session.apply(Action::EstimatesFinished);

        let total = self.session.total();
        info!(total = total, "Estimates updated");
        EstimateReport { results, total }
    }

    fn outcome_for(&self, id: LineItemId, effect: Effect) -> Outcome {
        match effect {
            Effect::Updated => Outcome::Applied,
            Effect::Discarded => Outcome::Discarded,
            Effect::Failed => self
                .session
                .item(id)
                .and_then(|item| item.last_failure.clone())
                .map(Outcome::Failed)
                .unwrap_or(Outcome::Ignored),
            _ => Outcome::Ignored,
        }
    }
}
