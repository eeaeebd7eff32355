use crate::chart::records::Record;
use std::collections::HashMap;

/// All records of one category, in file order
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub category: String,
    pub points: Vec<Record>,
}

/// Group records by category, keeping first-appearance order of categories
pub fn group_by_category(records: &[Record]) -> Vec<Series> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Series> = Vec::new();

    for record in records {
        let slot = *index.entry(record.category.as_str()).or_insert_with(|| {
            groups.push(Series {
                category: record.category.clone(),
                points: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].points.push(record.clone());
    }

    groups
}
