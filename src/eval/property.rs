use crate::foundation::core::Axis;

/// Layout spec field addressed by a per-axis property such as `sizeAbsolute.y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutField {
    /// `translation.*`
    Translation,
    /// `rotation.*` (radians)
    Rotation,
    /// `scale.*`
    Scale,
    /// `sizeAbsolute.*`
    SizeAbsolute,
    /// `sizeProportional.*`
    SizeProportional,
    /// `sizeDifferential.*`
    SizeDifferential,
    /// `sizeMode.*`
    SizeMode,
    /// `align.*`
    Align,
    /// `mount.*`
    Mount,
    /// `origin.*`
    Origin,
}

impl LayoutField {
    fn parse(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "translation" => Self::Translation,
            "rotation" => Self::Rotation,
            "scale" => Self::Scale,
            "sizeAbsolute" => Self::SizeAbsolute,
            "sizeProportional" => Self::SizeProportional,
            "sizeDifferential" => Self::SizeDifferential,
            "sizeMode" => Self::SizeMode,
            "align" => Self::Align,
            "mount" => Self::Mount,
            "origin" => Self::Origin,
            _ => return None,
        })
    }
}

/// Classification of a property name, resolved once per name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// One axis of one layout field.
    Layout(LayoutField, Axis),
    /// `opacity`
    Opacity,
    /// `shown`
    Shown,
    /// `content` (text replacement)
    Content,
    /// `children` (child-list replacement)
    Children,
    /// `playback` (timeline control)
    Playback,
    /// `controlFlow.if`
    ControlFlowIf,
    /// `controlFlow.repeat`
    ControlFlowRepeat,
    /// `controlFlow.placeholder`
    ControlFlowPlaceholder,
    /// `style.<subkey>`
    Style(String),
    /// Anything else: a plain attribute.
    Attribute,
}

impl PropertyKind {
    /// Classify `name`.
    pub fn parse(name: &str) -> Self {
        match name {
            "opacity" => return Self::Opacity,
            "shown" => return Self::Shown,
            "content" => return Self::Content,
            "children" => return Self::Children,
            "playback" => return Self::Playback,
            "controlFlow.if" => return Self::ControlFlowIf,
            "controlFlow.repeat" => return Self::ControlFlowRepeat,
            "controlFlow.placeholder" => return Self::ControlFlowPlaceholder,
            _ => {}
        }
        if let Some(sub) = name.strip_prefix("style.") {
            if !sub.is_empty() {
                return Self::Style(sub.to_owned());
            }
        }
        if let Some((prefix, suffix)) = name.split_once('.') {
            if let (Some(field), Some(axis)) = (LayoutField::parse(prefix), Axis::parse(suffix)) {
                return Self::Layout(field, axis);
            }
        }
        Self::Attribute
    }

    /// Control-flow properties that can add, remove, or replace elements.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ControlFlowIf | Self::ControlFlowRepeat | Self::ControlFlowPlaceholder
        )
    }

    /// Properties that always belong to the mutable timeline index.
    pub fn is_always_mutable(&self) -> bool {
        self.is_structural() || matches!(self, Self::Playback)
    }
}
