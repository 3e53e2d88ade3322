//! Creator extraction and person enrichment.
//!
//! Every person association on the source becomes one creator, with the
//! name assembled from whatever parts exist. Internal persons get an
//! extra Pure lookup for their ORCID; external persons are not queryable
//! and are skipped with a log note. Creators whose externalId maps to a
//! repository user also enrich the record's owner set.

use serde_json::Value;
use tracing::{debug, warn};

use purerdm_core::extract::Seg::{Index as I, Key as K};
use purerdm_core::extract::{get_path, non_empty_str};
use purerdm_core::record::{Affiliation, AffiliationIdentifiers, Person, SourceRecord};
use purerdm_core::traits::{PureApi, RdmApi, SyncStore};
use purerdm_core::Result;

use super::{Draft, Transformer};

const NO_FIRST_NAME: &str = "(first name not specified)";
const NO_LAST_NAME: &str = "(last name not specified)";

pub(super) async fn apply<P, R, S>(
    t: &Transformer<'_, P, R, S>,
    source: &SourceRecord,
    mut draft: Draft,
) -> Result<Draft>
where
    P: PureApi + ?Sized,
    R: RdmApi + ?Sized,
    S: SyncStore + ?Sized,
{
    let Some(associations) = source.at(&[K("personAssociations")]).and_then(Value::as_array)
    else {
        return Ok(draft);
    };

    for association in associations {
        let first = non_empty_str(association, &[K("name"), K("firstName")])
            .unwrap_or(NO_FIRST_NAME);
        let last =
            non_empty_str(association, &[K("name"), K("lastName")]).unwrap_or(NO_LAST_NAME);
        let mut person = Person::personal(format!("{} {}", first, last));

        // An external-person uuid takes precedence over the internal one.
        let is_external = get_path(association, &[K("externalPerson")]).is_some();
        let person_uuid = non_empty_str(association, &[K("externalPerson"), K("uuid")])
            .or_else(|| non_empty_str(association, &[K("person"), K("uuid")]));
        person.identifiers.uuid = person_uuid.map(str::to_string);

        let external_id = non_empty_str(association, &[K("person"), K("externalId")]);
        person.identifiers.external_id = external_id.map(str::to_string);

        if let Some(uuid) = person_uuid {
            if is_external {
                debug!(person = uuid, "External person, skipping ORCID lookup");
            } else {
                person.identifiers.orcid = lookup_orcid(t, uuid).await;
            }
        }

        if let Some(units) = get_path(association, &[K("organisationalUnits")])
            .and_then(Value::as_array)
        {
            for unit in units {
                // Only units with both a name and an externalId are usable
                // as affiliations.
                let name = non_empty_str(unit, &[K("names"), I(0), K("value")]);
                let unit_external_id = non_empty_str(unit, &[K("externalId")]);
                if let (Some(name), Some(unit_external_id)) = (name, unit_external_id) {
                    person.affiliations.push(Affiliation {
                        name: name.to_string(),
                        identifiers: AffiliationIdentifiers {
                            external_id: unit_external_id.to_string(),
                            uuid: non_empty_str(unit, &[K("uuid")]).map(str::to_string),
                        },
                    });
                }
            }
        }

        if let Some(external_id) = external_id {
            if let Some(user_id) = t.store.user_id_for(external_id)? {
                draft.owners.insert(user_id);
            }
        }

        draft.record.creators.push(person);
    }
    Ok(draft)
}

/// Fetch a person's ORCID from Pure; a failed lookup degrades to `None`.
async fn lookup_orcid<P, R, S>(t: &Transformer<'_, P, R, S>, uuid: &str) -> Option<String>
where
    P: PureApi + ?Sized,
    R: RdmApi + ?Sized,
    S: SyncStore + ?Sized,
{
    match t.pure.person(uuid).await {
        Ok(value) => non_empty_str(&value, &[K("orcid")]).map(str::to_string),
        Err(e) => {
            warn!(person = uuid, error = %e, "Person lookup failed");
            None
        }
    }
}
