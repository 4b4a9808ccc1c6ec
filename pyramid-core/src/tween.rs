/// Delayed, eased property interpolation.
///
/// A [`Timeline`] holds tweens keyed by a caller-defined target type. Each
/// tween waits for its delay, captures the property's current value as its
/// start, then eases towards its end value. The timeline is driven with
/// absolute time (seconds since it started), so frame rate only affects how
/// often values are written, not where they end up.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, value},
    sequence::preceded,
    IResult,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TweenError {
    #[error("unknown ease {0:?}")]
    UnknownEase(String),
}

/// Easing curves; `Power*(k)` raises progress to the `k + 1`th power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    PowerIn(u32),
    PowerOut(u32),
    PowerInOut(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    In,
    Out,
    InOut,
}

fn power_name(input: &str) -> IResult<&str, u32> {
    alt((
        preceded(tag("power"), map_res(digit1, |d: &str| d.parse::<u32>())),
        value(1, tag("quad")),
        value(2, tag("cubic")),
        value(3, tag("quart")),
        value(4, tag("quint")),
    ))(input)
}

fn direction(input: &str) -> IResult<&str, Direction> {
    preceded(
        char('.'),
        alt((
            value(Direction::InOut, tag("inOut")),
            value(Direction::In, tag("in")),
            value(Direction::Out, tag("out")),
        )),
    )(input)
}

fn power_ease(input: &str) -> IResult<&str, Ease> {
    let (input, power) = power_name(input)?;
    let (input, dir) = opt(direction)(input)?;
    let ease = match (power, dir.unwrap_or(Direction::Out)) {
        (0, _) => Ease::Linear,
        (k, Direction::In) => Ease::PowerIn(k),
        (k, Direction::Out) => Ease::PowerOut(k),
        (k, Direction::InOut) => Ease::PowerInOut(k),
    };
    Ok((input, ease))
}

fn linear_ease(input: &str) -> IResult<&str, Ease> {
    value(Ease::Linear, alt((tag("none"), tag("linear"))))(input)
}

impl Ease {
    /// Parse names like `power2.out`, `quad.inOut`, `none`. A bare power
    /// name eases out.
    pub fn parse(name: &str) -> Result<Self, TweenError> {
        let trimmed = name.trim();
        all_consuming(alt((linear_ease, power_ease)))(trimmed)
            .map(|(_, ease)| ease)
            .map_err(|_| TweenError::UnknownEase(trimmed.to_string()))
    }

    /// Map linear progress in `0..=1` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::PowerIn(k) => t.powi(k as i32 + 1),
            Ease::PowerOut(k) => 1.0 - (1.0 - t).powi(k as i32 + 1),
            Ease::PowerInOut(k) => {
                let exp = k as i32 + 1;
                if t < 0.5 {
                    (2.0 * t).powi(exp) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
                }
            }
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Ease::PowerOut(1)
    }
}

/// Resolves tween targets to the live values they animate.
pub trait Animate<T> {
    fn property_mut(&mut self, target: T) -> Option<&mut f32>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    pub target: T,
    pub to: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
    from: Option<f32>,
    finished: bool,
}

impl<T> Tween<T> {
    pub fn end_time(&self) -> f32 {
        self.delay + self.duration.max(0.0)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Value captured when the tween started, if it has
    pub fn start_value(&self) -> Option<f32> {
        self.from
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline<T> {
    tweens: Vec<Tween<T>>,
    time: f32,
}

impl<T: Copy> Timeline<T> {
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            time: 0.0,
        }
    }

    /// Queue a tween from the property's value at start time to `to`.
    pub fn to(&mut self, target: T, to: f32, duration: f32, delay: f32, ease: Ease) -> &mut Self {
        self.tweens.push(Tween {
            target,
            to,
            duration,
            delay: delay.max(0.0),
            ease,
            from: None,
            finished: false,
        });
        self
    }

    pub fn tweens(&self) -> &[Tween<T>] {
        &self.tweens
    }

    /// Latest end time over all tweens
    pub fn duration(&self) -> f32 {
        self.tweens.iter().map(Tween::end_time).fold(0.0, f32::max)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_complete(&self) -> bool {
        self.tweens.iter().all(|t| t.finished)
    }

    /// Write every active tween's value for absolute time `time`.
    ///
    /// Tweens whose target no longer resolves are dropped as finished.
    /// Time never runs backwards; an earlier `time` is ignored.
    pub fn advance_to<A>(&mut self, time: f32, subject: &mut A)
    where
        A: Animate<T> + ?Sized,
    {
        if time < self.time {
            return;
        }
        self.time = time;

        for tween in self.tweens.iter_mut().filter(|t| !t.finished) {
            if time < tween.delay {
                continue;
            }
            let Some(property) = subject.property_mut(tween.target) else {
                tween.finished = true;
                continue;
            };
            let from = *tween.from.get_or_insert(*property);

            let progress = if tween.duration <= 0.0 {
                1.0
            } else {
                (time - tween.delay) / tween.duration
            };
            if progress >= 1.0 {
                *property = tween.to;
                tween.finished = true;
            } else {
                *property = from + (tween.to - from) * tween.ease.apply(progress);
            }
        }
    }

    /// Jump straight to the end state.
    pub fn finish<A>(&mut self, subject: &mut A)
    where
        A: Animate<T> + ?Sized,
    {
        self.time = self.duration().max(self.time);
        for tween in self.tweens.iter_mut().filter(|t| !t.finished) {
            if let Some(property) = subject.property_mut(tween.target) {
                tween.from.get_or_insert(*property);
                *property = tween.to;
            }
            tween.finished = true;
        }
    }
}

impl<T: Copy> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Values(Vec<f32>);

    impl Animate<usize> for Values {
        fn property_mut(&mut self, target: usize) -> Option<&mut f32> {
            self.0.get_mut(target)
        }
    }

    #[test]
    fn test_parse_ease_names() {
        assert_eq!(Ease::parse("power2.out").unwrap(), Ease::PowerOut(2));
        assert_eq!(Ease::parse("power3.inOut").unwrap(), Ease::PowerInOut(3));
        assert_eq!(Ease::parse("quad.in").unwrap(), Ease::PowerIn(1));
        assert_eq!(Ease::parse("power1").unwrap(), Ease::PowerOut(1));
        assert_eq!(Ease::parse("none").unwrap(), Ease::Linear);
        assert_eq!(Ease::parse("power0.in").unwrap(), Ease::Linear);
        assert!(Ease::parse("bounce.out").is_err());
        assert!(Ease::parse("power2.sideways").is_err());
    }

    #[test]
    fn test_ease_endpoints() {
        for ease in [Ease::Linear, Ease::PowerIn(2), Ease::PowerOut(2), Ease::PowerInOut(2)] {
            assert_relative_eq!(ease.apply(0.0), 0.0);
            assert_relative_eq!(ease.apply(1.0), 1.0);
        }
        // power2.out is cubic
        assert_relative_eq!(Ease::PowerOut(2).apply(0.5), 0.875);
        assert_relative_eq!(Ease::PowerInOut(1).apply(0.5), 0.5);
    }

    #[test]
    fn test_delay_then_capture_start() {
        let mut values = Values(vec![0.0]);
        let mut timeline: Timeline<usize> = Timeline::new();
        timeline.to(0, 10.0, 1.0, 0.5, Ease::Linear);

        timeline.advance_to(0.25, &mut values);
        assert_relative_eq!(values.0[0], 0.0);
        assert!(timeline.tweens()[0].start_value().is_none());

        // changed before the tween starts: the tween picks it up
        values.0[0] = 4.0;
        timeline.advance_to(1.0, &mut values);
        assert_relative_eq!(values.0[0], 7.0);
        assert_eq!(timeline.tweens()[0].start_value(), Some(4.0));

        timeline.advance_to(2.0, &mut values);
        assert_relative_eq!(values.0[0], 10.0);
        assert!(timeline.is_complete());
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut values = Values(vec![1.0]);
        let mut timeline: Timeline<usize> = Timeline::new();
        timeline.to(0, 3.0, 0.0, 0.2, Ease::default());
        timeline.advance_to(0.1, &mut values);
        assert_relative_eq!(values.0[0], 1.0);
        timeline.advance_to(0.2, &mut values);
        assert_relative_eq!(values.0[0], 3.0);
    }

    #[test]
    fn test_missing_target_finishes() {
        let mut values = Values(vec![]);
        let mut timeline: Timeline<usize> = Timeline::new();
        timeline.to(3, 1.0, 1.0, 0.0, Ease::Linear);
        timeline.advance_to(0.5, &mut values);
        assert!(timeline.is_complete());
    }

    #[test]
    fn test_finish_and_duration() {
        let mut values = Values(vec![0.0, 0.0]);
        let mut timeline: Timeline<usize> = Timeline::new();
        timeline
            .to(0, 1.0, 1.5, 0.0, Ease::PowerOut(2))
            .to(1, 2.0, 1.0, 0.9, Ease::PowerOut(2));
        assert_relative_eq!(timeline.duration(), 1.9);
        timeline.finish(&mut values);
        assert_eq!(values.0, vec![1.0, 2.0]);
        assert!(timeline.is_complete());
    }
}
