use scenegraph::Easing;

struct Fade {
    from: f32,
    to: f32,
    delay: f32,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Fade {
    /// Current value, or `None` while the start delay is still running.
    fn value(&self) -> Option<f32> {
        if self.elapsed < self.delay {
            return None;
        }

        let progress = ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0);
        let eased = self.easing.apply(progress);
        Some(self.from + (self.to - self.from) * eased)
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

/// Whole-view opacity plus a backdrop layer, with delayed eased fades advanced per tick.
pub struct View {
    opacity: f32,
    backdrop_opacity: f32,
    fade: Option<Fade>,
    backdrop_fade: Option<Fade>,
}

impl View {
    /// Resting opacity of the backdrop layer.
    pub const BACKDROP_OPACITY: f32 = 0.75;

    pub fn new() -> Self {
        Self {
            opacity: 1.0,
            backdrop_opacity: Self::BACKDROP_OPACITY,
            fade: None,
            backdrop_fade: None,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn backdrop_opacity(&self) -> f32 {
        self.backdrop_opacity
    }

    /// Fade the view opacity to `target` over `duration` seconds, starting after
    /// `delay` seconds. Replaces any fade already running.
    pub fn fade_to(&mut self, target: f32, duration: f32, delay: f32, easing: Easing) {
        self.fade = Some(Fade {
            from: self.opacity,
            to: target,
            delay,
            duration,
            elapsed: 0.0,
            easing,
        });
    }

    pub fn fade_backdrop_to(&mut self, target: f32, duration: f32, delay: f32, easing: Easing) {
        self.backdrop_fade = Some(Fade {
            from: self.backdrop_opacity,
            to: target,
            delay,
            duration,
            elapsed: 0.0,
            easing,
        });
    }

    pub fn update(&mut self, delta_time: f32) {
        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += delta_time;
            if let Some(value) = fade.value() {
                self.opacity = value;
            }
            if fade.is_finished() {
                self.opacity = fade.to;
                self.fade = None;
            }
        }

        if let Some(fade) = self.backdrop_fade.as_mut() {
            fade.elapsed += delta_time;
            if let Some(value) = fade.value() {
                self.backdrop_opacity = value;
            }
            if fade.is_finished() {
                self.backdrop_opacity = fade.to;
                self.backdrop_fade = None;
            }
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}
