use crate::spot::types::Region;

/// Drops every region whose id starts with one of `excluded_prefixes`.
///
/// A list holding only the empty string means "exclude nothing"; it is what an
/// empty `--exclude-regions ""` flag splits into.
pub fn filter_regions<P: AsRef<str>>(
    regions: Vec<Region>,
    excluded_prefixes: &[P],
) -> Vec<Region> {
    if let [only] = excluded_prefixes {
        if only.as_ref().is_empty() {
            return regions;
        }
    }

    regions
        .into_iter()
        .filter(|region| {
            let excluded = excluded_prefixes
                .iter()
                .any(|prefix| region.id.starts_with(prefix.as_ref()));
            if excluded {
                tracing::debug!(region = %region.id, "excluding region");
            } else {
                tracing::debug!(region = %region.id, "including region");
            }
            !excluded
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn regions(ids: &[&str]) -> Vec<Region> {
        ids.iter().map(|id| Region::new(*id, format!("{id} description"))).collect()
    }

    fn ids(regions: &[Region]) -> Vec<&str> {
        regions.iter().map(|region| region.id.as_str()).collect()
    }

    #[test]
    fn excludes_china_regions() {
        let filtered = filter_regions(regions(&["us-east-1", "cn-north-1"]), &["cn-"]);

        assert_eq!(ids(&filtered), vec!["us-east-1"]);
    }

    #[rstest]
    #[case::sole_empty_prefix(vec![""])]
    #[case::no_prefixes(vec![])]
    fn keeps_everything_without_exclusions(#[case] prefixes: Vec<&str>) {
        let all = regions(&["us-east-1", "cn-north-1", "us-gov-west-1"]);

        let filtered = filter_regions(all.clone(), &prefixes);

        assert_eq!(filtered, all);
    }

    #[rstest]
    #[case(vec!["us-gov", "cn-"])]
    #[case(vec!["eu-"])]
    #[case(vec!["us-"])]
    #[case(vec!["ap-south", "me-", "sa-east-1"])]
    #[case(vec!["nothing-matches"])]
    fn never_keeps_an_excluded_prefix(#[case] prefixes: Vec<&str>) {
        let all = regions(&[
            "us-east-1",
            "us-gov-west-1",
            "cn-north-1",
            "eu-west-1",
            "ap-south-1",
            "ap-southeast-2",
            "me-south-1",
            "sa-east-1",
        ]);

        let filtered = filter_regions(all.clone(), &prefixes);

        for region in &filtered {
            assert!(
                prefixes.iter().all(|prefix| !region.id.starts_with(prefix)),
                "{} should have been excluded by {:?}",
                region.id,
                prefixes
            );
        }
        let dropped = all.len() - filtered.len();
        let expected_dropped = all
            .iter()
            .filter(|region| prefixes.iter().any(|prefix| region.id.starts_with(prefix)))
            .count();
        assert_eq!(dropped, expected_dropped);
    }

    #[test]
    fn empty_prefix_among_others_excludes_everything() {
        let filtered = filter_regions(regions(&["us-east-1", "eu-west-1"]), &["cn-", ""]);

        assert!(filtered.is_empty());
    }
}
