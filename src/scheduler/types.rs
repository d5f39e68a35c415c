use serde::{Deserialize, Serialize};

/// "Run every Nth minute/hour/day/month" cadence.
///
/// All four fields are accepted in job definitions, but only minute
/// granularity triggers; the coarser fields are carried as inert data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub month: u32,
}

impl Interval {
    pub fn minutes(minute: u32) -> Self {
        Self {
            minute,
            ..Self::default()
        }
    }
}

/// A named, recurring binding of (module, cluster, config name) to a trigger
/// interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Assigned on creation when the definition arrives without one.
    #[serde(default)]
    pub id: String,
    pub module: String,
    pub cluster: String,
    /// Name of the config the instance should run with; the snapshot itself
    /// is resolved by (module, cluster) at dispatch time.
    #[serde(default)]
    pub config: String,
    pub interval: Interval,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Job {
    /// Two jobs are duplicates when they share an identifier, or bind the
    /// same (module, cluster, interval). Either alone rejects a create.
    pub fn duplicates(&self, other: &Job) -> bool {
        self.id == other.id
            || (self.module == other.module
                && self.cluster == other.cluster
                && self.interval == other.interval)
    }

    /// The eligibility rule. A job with a dispatch in flight never fires
    /// again until that attempt finishes; otherwise it fires on every minute
    /// its interval divides. A zero interval never fires.
    pub fn is_time_to_run(&self, current_minute: u32, running: bool) -> bool {
        if running || self.interval.minute == 0 {
            return false;
        }
        current_minute % self.interval.minute == 0
    }
}

/// Selects jobs by identifier, by (module, cluster, interval), by
/// (module, cluster), or by module. The most specific constraint wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub interval: Option<Interval>,
}

impl JobFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_module(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Self::default()
        }
    }

    pub fn by_cluster(module: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            cluster: Some(cluster.into()),
            ..Self::default()
        }
    }

    /// Applies the precedence order to one job.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(id) = &self.id {
            return job.id == *id;
        }
        match (&self.module, &self.cluster, &self.interval) {
            (Some(module), Some(cluster), Some(interval)) => {
                job.module == *module && job.cluster == *cluster && job.interval == *interval
            }
            (Some(module), Some(cluster), None) => {
                job.module == *module && job.cluster == *cluster
            }
            (Some(module), None, _) => job.module == *module,
            _ => true,
        }
    }
}
