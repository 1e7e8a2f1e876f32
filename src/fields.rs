//! Flow fields that can be used for breakdown and filtering.

use crate::config::DictFieldConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub short_label: String,
}

impl FieldSpec {
    fn base(name: &str, label: &str, short_label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            short_label: short_label.to_string(),
        }
    }
}

const BASE_FIELDS: [(&str, &str, &str); 16] = [
    ("agent", "Agent", "A."),
    ("int_in", "Interface In", "Int.In"),
    ("int_out", "Interface Out", "Int.Out"),
    ("tos", "Type of Service", "TOS"),
    ("dscp", "Differentiated Services Code Point", "DSCP"),
    ("src_ip_addr", "Source IP", "Src.IP"),
    ("src_ip_pfx", "Source IP Prefix", "Src.IP.Pfx"),
    ("dst_ip_addr", "Destination IP", "Dst.IP"),
    ("dst_ip_pfx", "Destination IP Prefix", "Dst.IP.Pfx"),
    ("nexthop", "Nexthop", "Nexthop"),
    ("next_asn", "Next ASN", "Next ASN"),
    ("src_asn", "Source ASN", "Src.AS"),
    ("dst_asn", "Destination ASN", "Dst.AS"),
    ("ip_protocol", "IP Protocol", "IP.Proto"),
    ("src_port", "Source Port", "Src.Port"),
    ("dst_port", "Destination Port", "Dst.Port"),
];

/// Ordered list of selectable fields. Dictionary columns follow their base field.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl FieldCatalog {
    pub fn new(dicts: &[DictFieldConfig]) -> Self {
        let mut fields = Vec::new();
        for (name, label, short_label) in BASE_FIELDS {
            fields.push(FieldSpec::base(name, label, short_label));
            for dict in dicts.iter().filter(|d| d.field == name) {
                for column in &dict.columns {
                    fields.push(FieldSpec {
                        name: format!("{}__{}", name, column),
                        label: format!("{} {}", label, title_case(&column.replace('_', " "))),
                        short_label: format!("{}.{}", short_label, title_case(column)),
                    });
                }
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Label for display; unknown names (e.g. from a shared fragment) show as-is.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map(|f| f.label.as_str()).unwrap_or(name)
    }

    /// Field name `offset` steps away from `current`, wrapping around.
    /// An unknown `current` starts from the first field.
    pub fn cycle(&self, current: &str, offset: isize) -> Option<&str> {
        if self.fields.is_empty() {
            return None;
        }
        let len = self.fields.len() as isize;
        let idx = match self.position(current) {
            Some(pos) => (pos as isize + offset).rem_euclid(len),
            None => 0,
        };
        Some(self.fields[idx as usize].name.as_str())
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
