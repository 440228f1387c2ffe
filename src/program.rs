use serde::Serialize;

/// One decoded Akai program. Every value is the decimal text of a single byte.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Program {
    pub name: String,
    pub keygroups: Vec<Keygroup>,
    pub prg_values: Vec<String>,
    pub out_values: Vec<String>,
    pub tune_values: Vec<String>,
    pub lfo_values: Vec<String>,
    pub lfo2_values: Vec<String>,
    pub mods_values: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Keygroup {
    pub klocation: Vec<String>,
    pub amp_env: Vec<String>,
    pub filter_env: Vec<String>,
    pub aux_env: Vec<String>,
    pub filter: Vec<String>,
    pub zone1: Vec<String>,
    pub zone2: Vec<String>,
    pub zone3: Vec<String>,
    pub zone4: Vec<String>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Keygroup {
    pub fn zones(&self) -> [&[String]; 4] {
        [&self.zone1, &self.zone2, &self.zone3, &self.zone4]
    }

    /// Sample names of the populated zones; the name is each zone's first token.
    pub fn sample_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.zones()
            .into_iter()
            .filter_map(|zone| zone.first().map(String::as_str))
    }
}
