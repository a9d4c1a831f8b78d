/// Display transform applied elementwise to nonzero flows. Zeros stay
/// zero so absent links never gain a width.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LinkScale {
    #[default]
    Identity,
    /// `sign(q) * ln(1 + |q|)`; compresses the heavy tail of
    /// detrital/primary flows while staying defined for signed fluxes.
    Log1p,
    Sqrt,
    Power(f64),
}

impl LinkScale {
    pub fn apply(self, q: f64) -> f64 {
        if q == 0.0 {
            return 0.0;
        }
        match self {
            LinkScale::Identity => q,
            LinkScale::Log1p => q.signum() * (1.0 + q.abs()).ln(),
            LinkScale::Sqrt => q.signum() * q.abs().sqrt(),
            LinkScale::Power(p) => q.signum() * q.abs().powf(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphOptions {
    /// Trophic levels are rounded to the nearest multiple of this
    /// fraction before being discretized into columns.
    pub round_to: f64,
    /// Experimental: keep flows into detritus groups. Detritus sits at
    /// trophic level 1, so displaying its inflows folds high-level
    /// return flows into the leftmost column and muddies the layering.
    pub show_detritus: bool,
    pub link_scale: LinkScale,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            round_to: 0.1,
            show_detritus: false,
            link_scale: LinkScale::Identity,
        }
    }
}
