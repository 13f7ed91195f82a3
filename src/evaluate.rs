//! ROUGE scoring of a generated summary against a reference.
//!
//! Both texts are lowercased, split on every non-alphanumeric character, and
//! tokens longer than three characters are reduced with the Snowball English
//! stemmer before any overlap is counted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

pub const DEFAULT_METRICS: &[Metric] = &[Metric::RougeN(1), Metric::RougeN(2), Metric::RougeL];

const PRECISION_DIGITS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// n-gram overlap, n in 1..=9.
    RougeN(u8),
    /// Longest common subsequence over the whole text.
    RougeL,
    /// Union LCS over newline-separated sentences.
    RougeLsum,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::RougeN(n) => write!(f, "rouge{n}"),
            Metric::RougeL => write!(f, "rougeL"),
            Metric::RougeLsum => write!(f, "rougeLsum"),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, CoreError> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "rougel" => Ok(Metric::RougeL),
            "rougelsum" => Ok(Metric::RougeLsum),
            other => other
                .strip_prefix("rouge")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=9).contains(n))
                .map(Metric::RougeN)
                .ok_or_else(|| CoreError::input(format!("Unknown metric: {s}"))),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated metric list such as `rouge1,rougeL`.
pub fn parse_metrics(list: &str) -> Result<Vec<Metric>, CoreError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Score {
    fn from_counts(hits: usize, generated_total: usize, reference_total: usize) -> Self {
        let precision = ratio(hits, generated_total);
        let recall = ratio(hits, reference_total);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision: round(precision),
            recall: round(recall),
            f1: round(f1),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn round(x: f64) -> f64 {
    let scale = 10f64.powi(PRECISION_DIGITS);
    (x * scale).round() / scale
}

/// Metric name to score. Serializes as a JSON object keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreTable(BTreeMap<Metric, Score>);

impl ScoreTable {
    pub fn get(&self, metric: Metric) -> Option<&Score> {
        self.0.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Metric, &Score)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Score `generated` against `reference` for each metric in `metrics`
/// (the default set when `metrics` is empty).
pub fn score(reference: &str, generated: &str, metrics: &[Metric]) -> Result<ScoreTable, CoreError> {
    if reference.trim().is_empty() {
        return Err(CoreError::input("Reference text is empty"));
    }
    if generated.trim().is_empty() {
        return Err(CoreError::input("Generated text is empty"));
    }

    let metrics = if metrics.is_empty() { DEFAULT_METRICS } else { metrics };
    let stemmer = Stemmer::create(Algorithm::English);
    let ref_tokens = tokenize(reference, &stemmer);
    let gen_tokens = tokenize(generated, &stemmer);

    let mut table = BTreeMap::new();
    for &metric in metrics {
        let s = match metric {
            Metric::RougeN(n) => rouge_n(&ref_tokens, &gen_tokens, n as usize),
            Metric::RougeL => rouge_l(&ref_tokens, &gen_tokens),
            Metric::RougeLsum => rouge_lsum(reference, generated, &stemmer),
        };
        table.insert(metric, s);
    }
    Ok(ScoreTable(table))
}

fn tokenize(text: &str, stemmer: &Stemmer) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.chars().count() > 3 {
                stemmer.stem(t).into_owned()
            } else {
                t.to_string()
            }
        })
        .collect()
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

fn rouge_n(reference: &[String], generated: &[String], n: usize) -> Score {
    let ref_counts = ngram_counts(reference, n);
    let gen_counts = ngram_counts(generated, n);

    let hits: usize = ref_counts
        .iter()
        .map(|(gram, &rc)| gen_counts.get(gram).map_or(0, |&gc| rc.min(gc)))
        .sum();

    Score::from_counts(hits, gen_counts.values().sum(), ref_counts.values().sum())
}

/// Last row of the LCS length table of `a` against `b`: entry `j` is the LCS
/// length of `a` and `b[..j]`. Two rows of `b.len() + 1` cells.
fn lcs_row<T: PartialEq>(a: &[T], b: &[T]) -> Vec<usize> {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            cur[j + 1] = if x == y { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    lcs_row(long, short)[short.len()]
}

fn rouge_l(reference: &[String], generated: &[String]) -> Score {
    let lcs = lcs_len(reference, generated);
    Score::from_counts(lcs, generated.len(), reference.len())
}

/// Indices into `reference` of one longest common subsequence with `candidate`.
fn lcs_indices(reference: &[String], candidate: &[String]) -> Vec<usize> {
    let a: Vec<&str> = reference.iter().map(String::as_str).collect();
    let b: Vec<&str> = candidate.iter().map(String::as_str).collect();
    let mut indices = Vec::new();
    hirschberg(&a, &b, 0, &mut indices);
    indices
}

/// Divide-and-conquer LCS recovery in linear space. Pushes matched indices
/// of `a` (shifted by `offset`) in increasing order.
fn hirschberg(a: &[&str], b: &[&str], offset: usize, out: &mut Vec<usize>) {
    if a.is_empty() || b.is_empty() {
        return;
    }
    if a.len() == 1 {
        if b.contains(&a[0]) {
            out.push(offset);
        }
        return;
    }

    let mid = a.len() / 2;
    let forward = lcs_row(&a[..mid], b);
    let a_rev: Vec<&str> = a[mid..].iter().rev().copied().collect();
    let b_rev: Vec<&str> = b.iter().rev().copied().collect();
    let backward = lcs_row(&a_rev, &b_rev);

    let split = (0..=b.len())
        .max_by_key(|&j| forward[j] + backward[b.len() - j])
        .unwrap_or(0);

    hirschberg(&a[..mid], &b[..split], offset, out);
    hirschberg(&a[mid..], &b[split..], offset + mid, out);
}

fn rouge_lsum(reference: &str, generated: &str, stemmer: &Stemmer) -> Score {
    let sentences = |text: &str| -> Vec<Vec<String>> {
        text.lines()
            .map(|line| tokenize(line, stemmer))
            .filter(|tokens| !tokens.is_empty())
            .collect()
    };
    let ref_sents = sentences(reference);
    let gen_sents = sentences(generated);

    let mut ref_left: HashMap<&str, usize> = HashMap::new();
    for t in ref_sents.iter().flatten() {
        *ref_left.entry(t.as_str()).or_insert(0) += 1;
    }
    let mut gen_left: HashMap<&str, usize> = HashMap::new();
    for t in gen_sents.iter().flatten() {
        *gen_left.entry(t.as_str()).or_insert(0) += 1;
    }
    let ref_total: usize = ref_left.values().sum();
    let gen_total: usize = gen_left.values().sum();

    let mut hits = 0usize;
    for r in &ref_sents {
        let union: BTreeSet<usize> = gen_sents.iter().flat_map(|c| lcs_indices(r, c)).collect();
        for idx in union {
            let token = r[idx].as_str();
            let (Some(rc), Some(gc)) = (ref_left.get(token).copied(), gen_left.get(token).copied()) else {
                continue;
            };
            if rc > 0 && gc > 0 {
                hits += 1;
                ref_left.insert(token, rc - 1);
                gen_left.insert(token, gc - 1);
            }
        }
    }

    Score::from_counts(hits, gen_total, ref_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF: &str = "the cat sat on the mat";
    const GEN: &str = "a cat sat on a mat";

    #[test]
    fn baseline_cat_on_mat() {
        let table = score(REF, GEN, &[]).unwrap();
        assert_eq!(table.len(), 3);

        let r1 = table.get(Metric::RougeN(1)).unwrap();
        assert_eq!((r1.precision, r1.recall, r1.f1), (0.6667, 0.6667, 0.6667));

        let r2 = table.get(Metric::RougeN(2)).unwrap();
        assert_eq!((r2.precision, r2.recall, r2.f1), (0.4, 0.4, 0.4));

        let rl = table.get(Metric::RougeL).unwrap();
        assert_eq!((rl.precision, rl.recall, rl.f1), (0.6667, 0.6667, 0.6667));
    }

    #[test]
    fn identical_texts_score_one() {
        let table = score("Revenue grew in the third quarter.", "Revenue grew in the third quarter.", &[]).unwrap();
        for (_, s) in table.iter() {
            assert_eq!(s.f1, 1.0);
        }
    }

    #[test]
    fn disjoint_texts_score_zero() {
        let table = score("alpha beta", "gamma delta", &[Metric::RougeN(1), Metric::RougeL]).unwrap();
        for (_, s) in table.iter() {
            assert_eq!((s.precision, s.recall, s.f1), (0.0, 0.0, 0.0));
        }
    }

    #[test]
    fn long_inputs_score_in_linear_space() {
        let reference: Vec<String> = (0..3000).map(|i| format!("w{i}")).collect();
        let generated: Vec<String> = reference.iter().step_by(2).cloned().collect();

        let table = score(&reference.join(" "), &generated.join(" "), &[Metric::RougeL, Metric::RougeLsum]).unwrap();
        for metric in [Metric::RougeL, Metric::RougeLsum] {
            let s = table.get(metric).unwrap();
            assert_eq!((s.precision, s.recall, s.f1), (1.0, 0.5, 0.6667), "{metric}");
        }
    }

    #[test]
    fn lcs_indices_follow_candidate_order() {
        let toks = |s: &str| s.split(' ').map(String::from).collect::<Vec<_>>();
        let reference = toks("a b c b d a b");
        let candidate = toks("b d a b c");

        let indices = lcs_indices(&reference, &candidate);
        assert_eq!(indices.len(), lcs_len(&reference, &candidate));
        assert_eq!(indices.len(), 4);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        let picked: Vec<&str> = indices.iter().map(|&i| reference[i].as_str()).collect();
        assert_eq!(picked, ["b", "d", "a", "b"]);
    }

    #[test]
    fn stemming_matches_word_forms() {
        let table = score("running", "runs", &[Metric::RougeN(1)]).unwrap();
        assert_eq!(table.get(Metric::RougeN(1)).unwrap().f1, 1.0);
    }

    #[test]
    fn precision_and_recall_are_directional() {
        let table = score("one two three four", "one two", &[Metric::RougeN(1)]).unwrap();
        let s = table.get(Metric::RougeN(1)).unwrap();
        assert_eq!(s.precision, 1.0);
        assert_eq!(s.recall, 0.5);
        assert_eq!(s.f1, 0.6667);
    }

    #[test]
    fn lsum_unions_sentence_lcs() {
        let reference = "the cat sat\nthe dog ran";
        let generated = "the cat ran\nthe dog sat";
        let table = score(reference, generated, &[Metric::RougeL, Metric::RougeLsum]).unwrap();
        assert_eq!(table.get(Metric::RougeLsum).unwrap().f1, 1.0);
        assert_eq!(table.get(Metric::RougeL).unwrap().f1, 0.6667);
    }

    #[test]
    fn punctuation_only_scores_zero() {
        let table = score("!!!", "???", &[Metric::RougeN(1)]).unwrap();
        assert_eq!(table.get(Metric::RougeN(1)).unwrap().f1, 0.0);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(score("", GEN, &[]).unwrap_err().kind(), "input_error");
        assert_eq!(score(REF, "  ", &[]).unwrap_err().kind(), "input_error");
    }

    #[test]
    fn metric_names_round_trip() {
        for name in ["rouge1", "rouge2", "rouge3", "rougeL", "rougeLsum"] {
            let m: Metric = name.parse().unwrap();
            assert_eq!(m.to_string(), name);
        }
        assert_eq!("ROUGEL".parse::<Metric>().unwrap(), Metric::RougeL);
        assert!("rouge0".parse::<Metric>().is_err());
        assert!("bleu".parse::<Metric>().is_err());
    }

    #[test]
    fn parses_metric_lists() {
        let m = parse_metrics("rouge1, rougeL,").unwrap();
        assert_eq!(m, vec![Metric::RougeN(1), Metric::RougeL]);
        assert!(parse_metrics("rouge1,nope").is_err());
    }

    #[test]
    fn table_serializes_by_name() {
        let table = score(REF, GEN, &[Metric::RougeN(1)]).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["rouge1"]["recall"], 0.6667);
    }
}
