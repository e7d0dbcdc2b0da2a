use serde::{Deserialize, Serialize};

/// Cost Explorer filter tree. External tagging makes serde emit the vendor's
/// own key names (`Dimensions`, `And`, `Not`), so the same type serves both
/// the client-supplied `filter` field and the builder output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpression {
    Dimensions(DimensionFilter),
    And(Vec<FilterExpression>),
    Not(Box<FilterExpression>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilter {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

impl FilterExpression {
    pub fn dimensions(key: &str, values: Vec<String>) -> Self {
        FilterExpression::Dimensions(DimensionFilter {
            key: key.to_string(),
            values,
        })
    }
}

/// User-facing filter options for the simplified cost-data endpoint. The
/// `include_*` toggles default to included; switching one off adds its
/// record-type label to a single combined exclusion leaf.
#[derive(Debug, Clone)]
pub struct CostFilterOptions {
    pub service: Option<String>,
    pub region: Option<String>,
    pub charge_type: Option<String>,
    pub include_support: bool,
    pub include_other_subscription: bool,
    pub include_upfront: bool,
    pub include_refund: bool,
    pub include_credit: bool,
    pub include_ri_fee: bool,
}

impl Default for CostFilterOptions {
    fn default() -> Self {
        CostFilterOptions {
            service: None,
            region: None,
            charge_type: None,
            include_support: true,
            include_other_subscription: true,
            include_upfront: true,
            include_refund: true,
            include_credit: true,
            include_ri_fee: true,
        }
    }
}

/// Builds the filter tree: zero conditions yields no filter, one yields the
/// bare leaf, two or more are combined with `And` in emission order
/// (service, region, charge type, exclusions).
pub fn build_cost_filter(options: &CostFilterOptions) -> Option<FilterExpression> {
    let mut conditions = Vec::new();

    if let Some(service) = &options.service {
        conditions.push(FilterExpression::dimensions("SERVICE", vec![service.clone()]));
    }
    if let Some(region) = &options.region {
        conditions.push(FilterExpression::dimensions("REGION", vec![region.clone()]));
    }
    if let Some(charge_type) = &options.charge_type {
        conditions.push(FilterExpression::dimensions(
            "RECORD_TYPE",
            vec![charge_type.clone()],
        ));
    }

    let mut exclusions = Vec::new();
    if !options.include_support {
        exclusions.push("Support".to_string());
    }
    if !options.include_other_subscription {
        exclusions.push("Other_Subscription".to_string());
    }
    if !options.include_upfront {
        exclusions.push("Fee".to_string());
    }
    if !options.include_refund {
        exclusions.push("Refund".to_string());
    }
    if !options.include_credit {
        exclusions.push("Credit".to_string());
    }
    if !options.include_ri_fee {
        exclusions.push("RIFee".to_string());
    }

    if !exclusions.is_empty() {
        conditions.push(FilterExpression::Not(Box::new(
            FilterExpression::dimensions("RECORD_TYPE", exclusions),
        )));
    }

    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(FilterExpression::And(conditions)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_yields_no_filter() {
        assert_eq!(build_cost_filter(&CostFilterOptions::default()), None);
    }

    #[test]
    fn single_condition_is_not_wrapped_in_and() {
        let options = CostFilterOptions {
            service: Some("Amazon EC2".to_string()),
            ..CostFilterOptions::default()
        };
        assert_eq!(
            build_cost_filter(&options),
            Some(FilterExpression::dimensions(
                "SERVICE",
                vec!["Amazon EC2".to_string()]
            ))
        );
    }

    #[test]
    fn single_disabled_toggle_yields_bare_not_leaf() {
        let options = CostFilterOptions {
            include_credit: false,
            ..CostFilterOptions::default()
        };
        assert_eq!(
            build_cost_filter(&options),
            Some(FilterExpression::Not(Box::new(
                FilterExpression::dimensions("RECORD_TYPE", vec!["Credit".to_string()])
            )))
        );
    }

    #[test]
    fn all_toggles_disabled_yields_one_not_leaf_with_fixed_order() {
        let options = CostFilterOptions {
            include_support: false,
            include_other_subscription: false,
            include_upfront: false,
            include_refund: false,
            include_credit: false,
            include_ri_fee: false,
            ..CostFilterOptions::default()
        };
        let expected_labels: Vec<String> = [
            "Support",
            "Other_Subscription",
            "Fee",
            "Refund",
            "Credit",
            "RIFee",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(
            build_cost_filter(&options),
            Some(FilterExpression::Not(Box::new(
                FilterExpression::dimensions("RECORD_TYPE", expected_labels)
            )))
        );
    }

    #[test]
    fn service_filter_and_disabled_support_combine_with_and() {
        let options = CostFilterOptions {
            service: Some("Amazon EC2".to_string()),
            include_support: false,
            ..CostFilterOptions::default()
        };
        assert_eq!(
            build_cost_filter(&options),
            Some(FilterExpression::And(vec![
                FilterExpression::dimensions("SERVICE", vec!["Amazon EC2".to_string()]),
                FilterExpression::Not(Box::new(FilterExpression::dimensions(
                    "RECORD_TYPE",
                    vec!["Support".to_string()]
                ))),
            ]))
        );
    }

    #[test]
    fn conditions_keep_emission_order() {
        let options = CostFilterOptions {
            service: Some("Amazon S3".to_string()),
            region: Some("eu-west-1".to_string()),
            charge_type: Some("Usage".to_string()),
            include_refund: false,
            ..CostFilterOptions::default()
        };
        let Some(FilterExpression::And(conditions)) = build_cost_filter(&options) else {
            panic!("expected an And expression");
        };
        assert_eq!(conditions.len(), 4);
        assert_eq!(
            conditions[0],
            FilterExpression::dimensions("SERVICE", vec!["Amazon S3".to_string()])
        );
        assert_eq!(
            conditions[1],
            FilterExpression::dimensions("REGION", vec!["eu-west-1".to_string()])
        );
        assert_eq!(
            conditions[2],
            FilterExpression::dimensions("RECORD_TYPE", vec!["Usage".to_string()])
        );
        assert!(matches!(conditions[3], FilterExpression::Not(_)));
    }

    #[test]
    fn filter_serializes_with_vendor_key_names() {
        let options = CostFilterOptions {
            service: Some("Amazon EC2".to_string()),
            include_support: false,
            ..CostFilterOptions::default()
        };
        let filter = build_cost_filter(&options).unwrap();
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({
                "And": [
                    {"Dimensions": {"Key": "SERVICE", "Values": ["Amazon EC2"]}},
                    {"Not": {"Dimensions": {"Key": "RECORD_TYPE", "Values": ["Support"]}}}
                ]
            })
        );
    }

    #[test]
    fn filter_round_trips_through_json() {
        let filter = FilterExpression::And(vec![
            FilterExpression::dimensions("SERVICE", vec!["AWS Lambda".to_string()]),
            FilterExpression::Not(Box::new(FilterExpression::dimensions(
                "RECORD_TYPE",
                vec!["Credit".to_string(), "Refund".to_string()],
            ))),
        ]);
        let json = serde_json::to_string(&filter).unwrap();
        let parsed: FilterExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, filter);
    }
}
