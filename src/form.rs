use crate::schema::Primitive;

/// Computed rendering state of a field, as observed by the host binding.
///
/// The engine never touches a real layout engine; the host reports the
/// handful of style facts the eligibility policy depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStyle {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity_zero: bool,
    pub box_width: u32,
    pub box_height: u32,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            opacity_zero: false,
            box_width: 120,
            box_height: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            selected,
        }
    }
}

/// The control behind a field, carrying its current value state.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldControl {
    /// Text-like inputs and textareas.
    Text { value: String },
    /// `input type="hidden"` — carries a value but is never rendered.
    Hidden { value: String },
    Checkbox { checked: bool },
    Radio { checked: bool },
    SelectOne { options: Vec<SelectOption> },
    SelectMulti { options: Vec<SelectOption> },
}

/// A live field inside a [`LiveForm`], mirroring one input/select/textarea.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveField {
    pub name: Option<String>,
    pub id: Option<String>,
    pub control: FieldControl,
    pub read_only: bool,
    pub disabled: bool,
    pub style: FieldStyle,
    /// Text of an enclosing `<label>`, when the field sits inside one.
    pub ancestor_label: Option<String>,
    pub placeholder: Option<String>,
}

impl LiveField {
    pub fn new(control: FieldControl) -> Self {
        Self {
            name: None,
            id: None,
            control,
            read_only: false,
            disabled: false,
            style: FieldStyle::default(),
            ancestor_label: None,
            placeholder: None,
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self::new(FieldControl::Text {
            value: value.to_string(),
        })
        .with_name(name)
    }

    pub fn hidden(name: &str, value: &str) -> Self {
        Self::new(FieldControl::Hidden {
            value: value.to_string(),
        })
        .with_name(name)
    }

    pub fn checkbox(name: &str, checked: bool) -> Self {
        Self::new(FieldControl::Checkbox { checked }).with_name(name)
    }

    pub fn radio(name: &str, checked: bool) -> Self {
        Self::new(FieldControl::Radio { checked }).with_name(name)
    }

    pub fn select_one(name: &str, options: Vec<SelectOption>) -> Self {
        Self::new(FieldControl::SelectOne { options }).with_name(name)
    }

    pub fn select_multi(name: &str, options: Vec<SelectOption>) -> Self {
        Self::new(FieldControl::SelectMulti { options }).with_name(name)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_style(mut self, style: FieldStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Read the field's semantic value: checked flag for checkbox/radio,
    /// selected option values for a multi-select, current value otherwise.
    pub fn read_value(&self) -> Primitive {
        match &self.control {
            FieldControl::Text { value } | FieldControl::Hidden { value } => {
                Primitive::Text(value.clone())
            }
            FieldControl::Checkbox { checked } | FieldControl::Radio { checked } => {
                Primitive::Bool(*checked)
            }
            FieldControl::SelectOne { options } => Primitive::Text(
                options
                    .iter()
                    .find(|o| o.selected)
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            ),
            FieldControl::SelectMulti { options } => Primitive::Many(
                options
                    .iter()
                    .filter(|o| o.selected)
                    .map(|o| o.value.clone())
                    .collect(),
            ),
        }
    }

    /// Write a captured value back with type-specific semantics.
    ///
    /// Checkbox/radio take the value's truthiness. A multi-select marks each
    /// option selected iff its value is listed. A single-select picks the
    /// option matching the value's text form and clears the rest; a
    /// non-matching value clears the selection. Text-like fields take the
    /// value's text form directly.
    pub fn apply(&mut self, value: &Primitive) {
        match &mut self.control {
            FieldControl::Text { value: current } | FieldControl::Hidden { value: current } => {
                *current = value.as_text();
            }
            FieldControl::Checkbox { checked } | FieldControl::Radio { checked } => {
                *checked = value.truthy();
            }
            FieldControl::SelectOne { options } => {
                let wanted = value.as_text();
                for option in options.iter_mut() {
                    option.selected = option.value == wanted;
                }
            }
            FieldControl::SelectMulti { options } => match value {
                Primitive::Many(values) => {
                    for option in options.iter_mut() {
                        option.selected = values.contains(&option.value);
                    }
                }
                other => {
                    // A scalar written to a multi-select behaves like a
                    // single-select assignment.
                    let wanted = other.as_text();
                    for option in options.iter_mut() {
                        option.selected = option.value == wanted;
                    }
                }
            },
        }
    }
}

/// A `<label for="...">` element associated with the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLabel {
    pub for_id: String,
    pub text: String,
}

impl FormLabel {
    pub fn new(for_id: &str, text: &str) -> Self {
        Self {
            for_id: for_id.to_string(),
            text: text.to_string(),
        }
    }
}

/// One live form: the record being snapshotted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveForm {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub labels: Vec<FormLabel>,
    pub fields: Vec<LiveField>,
}

impl LiveForm {
    pub fn new(id: Option<&str>, classes: &[&str]) -> Self {
        Self {
            id: id.map(str::to_string),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            labels: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<LiveField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_labels(mut self, labels: Vec<FormLabel>) -> Self {
        self.labels = labels;
        self
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes.iter().any(|c| c == token)
    }
}

/// The host's view of the page: its URL and the forms it contains, in
/// document order.
#[derive(Debug, Clone, Default)]
pub struct FormDocument {
    pub url: String,
    pub forms: Vec<LiveForm>,
}

impl FormDocument {
    pub fn new(url: &str, forms: Vec<LiveForm>) -> Self {
        Self {
            url: url.to_string(),
            forms,
        }
    }
}
