//! ARPA text format reader

use super::backoff::BackoffLm;
use std::io::BufRead;
use tracing::warn;
use verso_core::{Error, Phrase, Result};

enum Section {
    Preamble,
    Counts,
    Ngrams(usize),
    End,
}

fn lm_error(line: usize, reason: impl Into<String>) -> Error {
    Error::LanguageModel {
        line,
        reason: reason.into(),
    }
}

pub(super) fn read_arpa<R: BufRead>(reader: R) -> Result<BackoffLm> {
    let mut section = Section::Preamble;
    let mut counts: Vec<usize> = Vec::new();
    let mut seen: Vec<usize> = Vec::new();
    let mut lm: Option<BackoffLm> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if text == "\\data\\" {
            section = Section::Counts;
            continue;
        }
        if text == "\\end\\" {
            section = Section::End;
            continue;
        }
        if let Some(n) = text
            .strip_prefix('\\')
            .and_then(|t| t.strip_suffix("-grams:"))
        {
            let n: usize = n
                .parse()
                .map_err(|_| lm_error(lineno, format!("bad section header '{}'", text)))?;
            if n == 0 || n > counts.len() {
                return Err(lm_error(lineno, format!("{}-grams not declared in \\data\\", n)));
            }
            if lm.is_none() {
                lm = Some(BackoffLm::new(counts.len()));
            }
            section = Section::Ngrams(n);
            continue;
        }

        match section {
            Section::Preamble | Section::End => {}
            Section::Counts => {
                let (n, count) = text
                    .strip_prefix("ngram ")
                    .and_then(|t| t.split_once('='))
                    .ok_or_else(|| lm_error(lineno, format!("expected 'ngram N=count', got '{}'", text)))?;
                let n: usize = n
                    .trim()
                    .parse()
                    .map_err(|_| lm_error(lineno, "bad n-gram order"))?;
                let count: usize = count
                    .trim()
                    .parse()
                    .map_err(|_| lm_error(lineno, "bad n-gram count"))?;
                if n != counts.len() + 1 {
                    return Err(lm_error(lineno, "n-gram orders must be listed in sequence"));
                }
                counts.push(count);
                seen.push(0);
            }
            Section::Ngrams(n) => {
                let mut fields = text.split_whitespace();
                let logprob = parse_float(fields.next(), lineno)?;
                let words: Vec<&str> = fields.collect();
                let backoff = match words.len() {
                    len if len == n => 0.0,
                    len if len == n + 1 => parse_float(words.last().copied(), lineno)?,
                    len => {
                        return Err(lm_error(
                            lineno,
                            format!("{}-gram entry has {} tokens", n, len),
                        ))
                    }
                };
                let ngram = Phrase::parse(&words[..n].join(" "));
                if let Some(lm) = lm.as_mut() {
                    lm.insert(ngram, logprob, backoff);
                }
                seen[n - 1] += 1;
            }
        }
    }

    let lm = lm.ok_or_else(|| lm_error(0, "no n-gram sections found"))?;
    for (i, (declared, found)) in counts.iter().zip(&seen).enumerate() {
        if declared != found {
            warn!(order = i + 1, declared, found, "ARPA n-gram count mismatch");
        }
    }
    Ok(lm)
}

fn parse_float(token: Option<&str>, line: usize) -> Result<f32> {
    let token = token.ok_or_else(|| lm_error(line, "missing probability"))?;
    token
        .parse()
        .map_err(|_| lm_error(line, format!("invalid number '{}'", token)))
}
