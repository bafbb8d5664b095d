use serde::{Deserialize, Serialize};

/// Column order of the durable log. Fixed; `TrialRecord`'s field order
/// must match it exactly, since rows are serialized positionally.
pub const RECORD_HEADER: [&str; 21] = [
    "DATE",
    "TIME",
    "ID",
    "BLOCK",
    "TRIAL",
    "STIM",
    "XLOC",
    "COND",
    "CRESP",
    "RESP",
    "RT",
    "ACC",
    "MAXTRIAL",
    "MAXBLOCK",
    "TRIALFEEDBACK",
    "BLOCKFEEDBACK",
    "STIMSIZE",
    "SCRNWIDTH",
    "SCRNHEIGHT",
    "VERSION",
    "TAG",
];

/// One row of the persisted log. `trial` is the session-wide ordering
/// key: strictly increasing, never reset at block boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub date: String,
    pub time: String,
    pub id: String,
    pub block: u32,
    pub trial: u64,
    pub stim: String,
    pub xloc: i32,
    pub cond: String,
    pub cresp: String,
    pub resp: String,
    pub rt: u64,
    pub acc: String,
    pub maxtrial: u64,
    pub maxblock: u32,
    pub trialfeedback: u8,
    pub blockfeedback: u8,
    pub stimsize: u32,
    pub scrnwidth: u32,
    pub scrnheight: u32,
    pub version: String,
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_has_one_column_per_field() {
        // serde_json sees the same fields csv will serialize.
        let record = TrialRecord {
            date: String::new(),
            time: String::new(),
            id: String::new(),
            block: 0,
            trial: 0,
            stim: String::new(),
            xloc: 0,
            cond: String::new(),
            cresp: String::new(),
            resp: String::new(),
            rt: 0,
            acc: String::new(),
            maxtrial: 0,
            maxblock: 0,
            trialfeedback: 0,
            blockfeedback: 0,
            stimsize: 0,
            scrnwidth: 0,
            scrnheight: 0,
            version: String::new(),
            tag: String::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json.as_object().unwrap().len(), RECORD_HEADER.len());
    }
}
