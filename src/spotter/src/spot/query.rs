use chrono::Utc;
use itertools::Itertools;

use crate::errors::QueryError;
use crate::spot::types::{PriceQuery, Region};

/// Builds the single spot price query for `region`, covering every instance
/// type at once. Duplicate instance types are dropped, order is kept.
pub fn build_query(
    region: &Region,
    instance_types: &[String],
    product_description: &str,
) -> Result<PriceQuery, QueryError> {
    if instance_types.is_empty() {
        return Err(QueryError::NoInstanceTypes {
            region: region.id.clone(),
        });
    }

    Ok(PriceQuery {
        region: region.id.clone(),
        instance_types: instance_types.iter().unique().cloned().collect(),
        product_description: product_description.to_string(),
        start_time: Utc::now(),
    })
}

/// One query per region. Regions that cannot be queried are logged and skipped.
pub fn build_queries(
    regions: &[Region],
    instance_types: &[String],
    product_description: &str,
) -> Vec<PriceQuery> {
    regions
        .iter()
        .filter_map(|region| {
            build_query(region, instance_types, product_description)
                .map_err(|err| tracing::warn!(region = %region.id, error = %err, "not dispatching"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRODUCT_DESCRIPTION;

    fn types(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn one_query_covers_all_instance_types() {
        let region = Region::new("us-east-1", "US East (N. Virginia)");
        let before = Utc::now();

        let query = build_query(&region, &types(&["t3.small", "t3.micro"]), PRODUCT_DESCRIPTION)
            .unwrap();

        assert_eq!(query.region, "us-east-1");
        assert_eq!(query.instance_types, types(&["t3.small", "t3.micro"]));
        assert_eq!(query.product_description, "Linux/UNIX");
        assert!(query.start_time >= before && query.start_time <= Utc::now());
    }

    #[test]
    fn duplicate_instance_types_are_dropped() {
        let region = Region::new("eu-west-1", "Europe (Ireland)");

        let query = build_query(
            &region,
            &types(&["m5.large", "t3.small", "m5.large"]),
            PRODUCT_DESCRIPTION,
        )
        .unwrap();

        assert_eq!(query.instance_types, types(&["m5.large", "t3.small"]));
    }

    #[test]
    fn empty_instance_types_are_rejected() {
        let region = Region::new("eu-west-1", "Europe (Ireland)");

        let err = build_query(&region, &[], PRODUCT_DESCRIPTION).unwrap_err();

        assert_eq!(
            err,
            QueryError::NoInstanceTypes {
                region: "eu-west-1".to_string()
            }
        );
    }

    #[test]
    fn no_queries_without_instance_types() {
        let regions = vec![
            Region::new("us-east-1", "US East (N. Virginia)"),
            Region::new("eu-west-1", "Europe (Ireland)"),
        ];

        assert!(build_queries(&regions, &[], PRODUCT_DESCRIPTION).is_empty());
        assert_eq!(
            build_queries(&regions, &types(&["t3.small"]), PRODUCT_DESCRIPTION).len(),
            2
        );
    }
}
