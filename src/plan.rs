//! Schema-driven plan computation.
//!
//! Given the prior state and the proposed state of a resource, [`compute_plan`]
//! lists the attribute changes and decides whether the resource has to be
//! replaced. Attributes set only by the provider are left unknown (`null`)
//! in the planned state whenever the resource will be created again.

use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};

/// Compute the plan for one resource.
///
/// - `prior_state == None`: create. Every configured attribute is added.
/// - `proposed_state == Null`: delete. Every prior attribute is removed.
/// - otherwise: update. `requires_replace` is set when any changed attribute
///   is `force_new`.
pub fn compute_plan(schema: &Schema, prior_state: Option<&Value>, proposed_state: &Value) -> PlanResult {
    match (prior_state, proposed_state) {
        (None, proposed) => plan_create(schema, proposed),
        (Some(prior), Value::Null) => plan_delete(prior),
        (Some(prior), proposed) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let mut planned = Map::new();
    let mut changes = Vec::new();

    for (name, attr) in &schema.attributes {
        if attr.flags.is_computed_only() {
            planned.insert(name.clone(), Value::Null);
            continue;
        }
        match proposed.get(name) {
            Some(v) if !v.is_null() => {
                changes.push(AttributeChange::added(name.clone(), v.clone()));
                planned.insert(name.clone(), v.clone());
            }
            _ => {
                planned.insert(name.clone(), Value::Null);
            }
        }
    }

    PlanResult::with_changes(Value::Object(planned), changes, false)
}

fn plan_delete(prior: &Value) -> PlanResult {
    let changes = match prior {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(name, v)| AttributeChange::removed(name.clone(), v.clone()))
            .collect(),
        _ => Vec::new(),
    };
    PlanResult::with_changes(Value::Null, changes, false)
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut planned = Map::new();
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.attributes {
        if attr.flags.is_computed_only() {
            continue;
        }
        let before = prior.get(name).filter(|v| !v.is_null());
        let after = proposed.get(name).filter(|v| !v.is_null());

        let change = match (before, after) {
            (None, None) => None,
            (None, Some(a)) => Some(AttributeChange::added(name.clone(), a.clone())),
            (Some(b), None) => Some(AttributeChange::removed(name.clone(), b.clone())),
            (Some(b), Some(a)) if b != a => {
                Some(AttributeChange::modified(name.clone(), b.clone(), a.clone()))
            }
            (Some(_), Some(_)) => None,
        };
        if let Some(change) = change {
            requires_replace |= attr.force_new;
            changes.push(change);
        }
        planned.insert(name.clone(), after.cloned().unwrap_or(Value::Null));
    }

    for (name, attr) in &schema.attributes {
        if !attr.flags.is_computed_only() {
            continue;
        }
        let value = if requires_replace {
            Value::Null
        } else {
            prior.get(name).cloned().unwrap_or(Value::Null)
        };
        planned.insert(name.clone(), value);
    }

    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn project_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("repo", Attribute::required_string().with_force_new())
    }

    fn ssh_key_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("project", Attribute::required_string().with_force_new())
            .with_attribute("hostname", Attribute::required_string().with_force_new())
            .with_attribute(
                "private_key",
                Attribute::required_string().with_force_new().sensitive(),
            )
            .with_attribute("fingerprint", Attribute::computed_string())
    }

    #[test]
    fn test_plan_create() {
        let plan = compute_plan(&project_schema(), None, &json!({"repo": "widgets"}));

        assert_eq!(plan.changes, vec![AttributeChange::added("repo", json!("widgets"))]);
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state, json!({"id": null, "repo": "widgets"}));
    }

    #[test]
    fn test_plan_no_change_keeps_computed() {
        let prior = json!({"id": "widgets", "repo": "widgets"});
        let plan = compute_plan(&project_schema(), Some(&prior), &json!({"repo": "widgets"}));

        assert!(!plan.has_changes());
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state, prior);
    }

    #[test]
    fn test_plan_force_new_change_replaces() {
        let prior = json!({
            "id": "widgets|github.com|aa:bb",
            "project": "widgets",
            "hostname": "github.com",
            "private_key": "KEY",
            "fingerprint": "aa:bb",
        });
        let proposed = json!({
            "project": "widgets",
            "hostname": "gitlab.com",
            "private_key": "KEY",
        });
        let plan = compute_plan(&ssh_key_schema(), Some(&prior), &proposed);

        assert!(plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(
            plan.change("hostname"),
            Some(&AttributeChange::modified("hostname", json!("github.com"), json!("gitlab.com")))
        );
        assert_eq!(plan.planned_state["fingerprint"], Value::Null);
        assert_eq!(plan.planned_state["id"], Value::Null);
    }

    #[test]
    fn test_plan_change_without_force_new_updates_in_place() {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("description", Attribute::optional_string());
        let prior = json!({"id": "1", "description": "old"});
        let plan = compute_plan(&schema, Some(&prior), &json!({"description": "new"}));

        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state, json!({"id": "1", "description": "new"}));

        let plan = compute_plan(&schema, Some(&prior), &json!({}));
        assert_eq!(
            plan.changes,
            vec![AttributeChange::removed("description", json!("old"))]
        );
    }

    #[test]
    fn test_plan_delete() {
        let prior = json!({"id": "widgets", "repo": "widgets"});
        let plan = compute_plan(&project_schema(), Some(&prior), &Value::Null);

        assert_eq!(plan.planned_state, Value::Null);
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
        assert!(!plan.requires_replace);
    }
}
