use anyhow::*;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::quant::imputation::{low_impute, ImputationInfo};

const IBAQ_PREFIX: &str = "iBAQ ";

/// One row of a MaxQuant `proteinGroups.txt` table.
#[derive(Clone, PartialEq, Debug)]
pub struct ProteinGroup {
    pub protein_ids: String,
    pub gene_names: String,
    pub reverse: bool,
    pub contaminant: bool,
    /// iBAQ per experiment title, zero values stored as missing
    pub ibaq: BTreeMap<String, Option<f64>>,
}

/// Rows of a `proteinGroups.txt` table and the titles of its iBAQ columns.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ProteinGroups {
    pub ibaq_titles: Vec<String>,
    pub groups: Vec<ProteinGroup>,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum IdColumn {
    ProteinIds,
    GeneNames,
}

impl IdColumn {
    fn value<'a>(&self, group: &'a ProteinGroup) -> &'a str {
        match self {
            IdColumn::ProteinIds => &group.protein_ids,
            IdColumn::GeneNames => &group.gene_names,
        }
    }
}

impl std::str::FromStr for IdColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<IdColumn> {
        match s {
            "Protein IDs" | "protein-ids" => Ok(IdColumn::ProteinIds),
            "Gene names" | "gene-names" => Ok(IdColumn::GeneNames),
            _ => bail!("unsupported id column '{}'", s),
        }
    }
}

pub fn read_protein_groups<R: Read>(reader: R) -> Result<ProteinGroups> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column_idx = |name: &str| headers.iter().position(|h| h == name);

    let ids_idx = column_idx("Protein IDs").ok_or_else(|| anyhow!("missing 'Protein IDs' column"))?;
    let genes_idx = column_idx("Gene names");
    let reverse_idx = column_idx("Reverse");
    let contaminant_idx = column_idx("Potential contaminant").or_else(|| column_idx("Contaminant"));

    let ibaq_columns: Vec<(usize, String)> = headers.iter().enumerate()
        .filter_map(|(idx, h)| h.strip_prefix(IBAQ_PREFIX).map(|title| (idx, title.to_string())))
        .collect();

    let mut groups = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").trim();

        let mut ibaq = BTreeMap::new();
        for (idx, title) in &ibaq_columns {
            let value = cell(Some(*idx));
            let parsed = if value.is_empty() || value == "NaN" {
                None
            } else {
                let v: f64 = value.parse().with_context(|| format!("invalid iBAQ value '{}' for '{}'", value, title))?;
                if v == 0.0 { None } else { Some(v) }
            };
            ibaq.insert(title.clone(), parsed);
        }

        groups.push(ProteinGroup {
            protein_ids: cell(Some(ids_idx)).to_string(),
            gene_names: cell(genes_idx).to_string(),
            reverse: cell(reverse_idx) == "+",
            contaminant: cell(contaminant_idx) == "+",
            ibaq,
        });
    }

    Ok(ProteinGroups {
        ibaq_titles: ibaq_columns.into_iter().map(|(_, title)| title).collect(),
        groups,
    })
}

#[derive(Clone, PartialEq, Debug)]
pub struct IbaqParams {
    pub titles: Vec<String>,
    /// Full or partial ids to keep; all rows when empty
    pub targets: Vec<String>,
    pub id_column: IdColumn,
    /// Id of the reference protein; the total iBAQ is used when absent
    pub normalise_to: Option<String>,
    /// Percentile of the low tail used for imputation; missing values are zero when absent
    pub impute: Option<f64>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RelativeIbaqRow {
    pub protein_ids: String,
    pub gene_names: String,
    /// Relative iBAQ per title, in the order of `IbaqParams::titles`
    pub values: Vec<f64>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RelativeIbaq {
    pub titles: Vec<String>,
    pub rows: Vec<RelativeIbaqRow>,
    pub imputation: BTreeMap<String, ImputationInfo>,
}

/// iBAQ of each target relative to the total iBAQ, or to a reference protein.
pub fn relative_ibaq<R: Rng + ?Sized>(table: &ProteinGroups, params: &IbaqParams, rng: &mut R) -> Result<RelativeIbaq> {
    if params.titles.is_empty() { bail!("at least one experiment title is required") }

    for title in &params.titles {
        if !table.ibaq_titles.contains(title) {
            bail!("column '{}{}' not found", IBAQ_PREFIX, title)
        }
    }

    let groups = &table.groups;
    let filtered: Vec<&ProteinGroup> = groups.iter().filter(|g| !g.reverse && !g.contaminant).collect();
    info!("{} of {} protein groups left after removing decoys and contaminants", filtered.len(), groups.len());

    let targets: Vec<&ProteinGroup> = if params.targets.is_empty() {
        filtered.clone()
    } else {
        filtered.iter().copied()
            .filter(|g| {
                let id = params.id_column.value(g);
                params.targets.iter().any(|t| id.contains(t.as_str()))
            })
            .collect()
    };
    if targets.is_empty() {
        warn!("none of the requested targets were found");
    }

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(params.titles.len());
    let mut imputation = BTreeMap::new();
    for title in &params.titles {
        let raw: Vec<Option<f64>> = targets.iter().map(|g| g.ibaq.get(title).copied().flatten()).collect();

        let values: Vec<f64> = match params.impute {
            Some(percentile) => {
                let log2_values: Vec<Option<f64>> = raw.iter().map(|v| v.map(f64::log2)).collect();
                let (imputed, info) = low_impute(&log2_values, percentile, rng)?;
                if let Some(info) = info {
                    info!("{}: imputed from N({:.3}, {:.3})", title, info.mean_subset, info.std_subset);
                    imputation.insert(title.clone(), info);
                }
                imputed.iter().map(|v| v.map(|l| l.exp2()).unwrap_or(0.0)).collect()
            }
            None => raw.iter().map(|v| v.unwrap_or(0.0)).collect(),
        };

        let denominator = match &params.normalise_to {
            Some(reference) => {
                let reference_rows: Vec<usize> = targets.iter().enumerate()
                    .filter(|(_, g)| params.id_column.value(g) == reference.as_str())
                    .map(|(idx, _)| idx)
                    .collect();
                if reference_rows.is_empty() {
                    bail!("reference '{}' to normalise to does not exist in the data", reference)
                }
                reference_rows.iter().map(|idx| values[*idx]).sum::<f64>()
            }
            None => filtered.iter().filter_map(|g| g.ibaq.get(title).copied().flatten()).sum::<f64>(),
        };
        if denominator == 0.0 {
            bail!("iBAQ denominator for '{}' is zero", title)
        }

        columns.push(values.iter().map(|v| v / denominator).collect());
    }

    let rows = targets.iter().enumerate()
        .map(|(row_idx, g)| RelativeIbaqRow {
            protein_ids: g.protein_ids.clone(),
            gene_names: g.gene_names.clone(),
            values: columns.iter().map(|col| col[row_idx]).collect(),
        })
        .collect();

    Ok(RelativeIbaq {
        titles: params.titles.clone(),
        rows,
        imputation,
    })
}

pub fn write_relative_ibaq<W: Write>(writer: W, result: &RelativeIbaq) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    let mut header = vec!["Protein IDs".to_string(), "Gene names".to_string()];
    header.extend(result.titles.iter().map(|t| format!("rel_iBAQ {}", t)));
    wtr.write_record(&header)?;

    for row in &result.rows {
        let mut record = vec![row.protein_ids.clone(), row.gene_names.clone()];
        record.extend(row.values.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

#[derive(Serialize)]
struct ImputationRow<'a> {
    title: &'a str,
    mean_full: f64,
    std_full: f64,
    mean_subset: f64,
    std_subset: f64,
}

/// Per title statistics of the log2 iBAQ distribution used for imputation.
pub fn write_imputation_info<W: Write>(writer: W, result: &RelativeIbaq) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for (title, info) in &result.imputation {
        wtr.serialize(ImputationRow {
            title,
            mean_full: info.mean_full,
            std_full: info.std_full,
            mean_subset: info.mean_subset,
            std_subset: info.std_subset,
        })?;
    }
    wtr.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PROTEIN_GROUPS: &str = "\
Protein IDs\tGene names\tiBAQ\tiBAQ WT\tiBAQ KO\tReverse\tPotential contaminant
P1;P1-2\tPEX5\t0\t100\t50\t\t
P2\tPEX14\t0\t300\t0\t\t
P3\tACT1\t0\t600\t150\t\t
REV__P4\t\t0\t1000\t1000\t+\t
CON__P5\tKRT1\t0\t1000\t1000\t\t+
";

    fn params() -> IbaqParams {
        IbaqParams {
            titles: vec!["WT".to_string(), "KO".to_string()],
            targets: vec!["PEX".to_string()],
            id_column: IdColumn::GeneNames,
            normalise_to: None,
            impute: None,
        }
    }

    #[test]
    fn reads_groups() {
        let table = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        assert_eq!(table.ibaq_titles, vec!["WT", "KO"]);
        let groups = &table.groups;
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0].ibaq["WT"], Some(100.0));
        assert_eq!(groups[1].ibaq["KO"], None);
        assert!(groups[3].reverse);
        assert!(groups[4].contaminant);
        assert!(!groups[0].ibaq.contains_key(""));
    }

    #[test]
    fn relative_to_total() {
        let groups = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = relative_ibaq(&groups, &params(), &mut rng).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].gene_names, "PEX5");
        assert_eq!(result.rows[0].values, vec![0.1, 0.25]);
        assert_eq!(result.rows[1].values, vec![0.3, 0.0]);
    }

    #[test]
    fn relative_to_reference() {
        let groups = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let params = IbaqParams { normalise_to: Some("PEX5".to_string()), ..params() };
        let result = relative_ibaq(&groups, &params, &mut rng).unwrap();
        assert_eq!(result.rows[1].values[0], 3.0);

        let params = IbaqParams { normalise_to: Some("PEX99".to_string()), ..params };
        assert!(relative_ibaq(&groups, &params, &mut rng).is_err());
    }

    #[test]
    fn unknown_title_is_an_error() {
        let groups = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let params = IbaqParams { titles: vec!["HET".to_string()], ..params() };
        assert!(relative_ibaq(&groups, &params, &mut rng).is_err());
    }

    #[test]
    fn unknown_title_is_reported_without_valid_rows() {
        let decoys_only = "\
Protein IDs\tGene names\tiBAQ WT\tReverse\tPotential contaminant
REV__P4\t\t1000\t+\t
";
        let mut rng = StdRng::seed_from_u64(0);
        let params = IbaqParams { titles: vec!["KO".to_string()], targets: vec![], ..params() };

        for text in [decoys_only, "Protein IDs\tiBAQ WT\n"] {
            let groups = read_protein_groups(text.as_bytes()).unwrap();
            let err = relative_ibaq(&groups, &params, &mut rng).unwrap_err();
            assert_eq!(err.to_string(), "column 'iBAQ KO' not found");
        }
    }

    #[test]
    fn imputation_fills_missing_values() {
        let groups = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let params = IbaqParams { targets: vec![], impute: Some(50.0), ..params() };
        let result = relative_ibaq(&groups, &params, &mut rng).unwrap();

        assert_eq!(result.rows.len(), 3);
        assert!(result.rows.iter().all(|row| row.values[1] > 0.0));
        assert!(result.imputation.contains_key("KO"));

        let mut out = Vec::new();
        write_imputation_info(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("title,mean_full,std_full,mean_subset,std_subset\n"));
        assert_eq!(text.lines().count(), 1 + result.imputation.len());
    }

    #[test]
    fn writes_table() {
        let groups = read_protein_groups(PROTEIN_GROUPS.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = relative_ibaq(&groups, &params(), &mut rng).unwrap();

        let mut out = Vec::new();
        write_relative_ibaq(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Protein IDs\tGene names\trel_iBAQ WT\trel_iBAQ KO\n"));
        assert!(text.contains("P1;P1-2\tPEX5\t0.1\t0.25\n"));
    }
}
