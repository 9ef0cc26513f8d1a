//! Procedural macros used to generate getters and setters for `AuthenticationSettings` entries

use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a vs_gets_and_sets definition, i.e., the
/// name of a value stored in an AuthenticationSettings map and the corresponding type.
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
}

/// SignatureWithDefault adds the value returned by the getter when the map has no entry for
/// the value name (or an entry of the wrong type). For example:
///     ```text
///     vs_gets_and_sets_with_default!(PS_CHECK_KEY_USAGE, bool, false);
///     ```
struct SignatureWithDefault {
    value_name: ValueName,
    value_type: ValueType,
    default_value: DefaultValue,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        if stream.is_empty() {
            return Err(stream.error("expected a setting name and a value type"));
        }
        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        Ok(Signature {
            value_name,
            value_type,
        })
    }
}

impl Parse for SignatureWithDefault {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        if stream.is_empty() {
            return Err(stream.error(
                "expected a setting name, a value type and a default value",
            ));
        }
        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        let _comma2: Token!(,) = stream.parse()?;
        let default_value: DefaultValue = stream.parse()?;
        Ok(SignatureWithDefault {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// is_string_numeric is used to determine if a string value contains only numeric characters,
/// i.e., to recognize the tail of types like u8 or u64.
fn is_string_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_numeric())
}

/// Names derived from a setting constant and its type: getter, setter and the variant of
/// AuthenticationSettingsTypes that carries the value.
struct Accessors {
    getter: Ident,
    setter: Ident,
    variant: Ident,
    getter_comment: String,
    setter_comment: String,
}

fn accessors(flag: &Ident, value_type: &Ident) -> Accessors {
    // PS_CHECK_KEY_USAGE -> check_key_usage
    let flag_str = flag.to_string();
    let base = flag_str
        .strip_prefix("PS_")
        .unwrap_or(flag_str.as_str())
        .to_lowercase();
    let getter_str = format!("get_{}", base);
    let setter_str = format!("set_{}", base);

    let type_str = value_type.to_string();
    let variant_str = if type_str == "bool" {
        "Bool".to_string()
    } else if type_str.len() > 1 && is_string_numeric(&type_str[1..]) {
        type_str.to_uppercase()
    } else {
        type_str
    };

    Accessors {
        getter: Ident::new(&getter_str, flag.span()),
        setter: Ident::new(&setter_str, flag.span()),
        variant: Ident::new(&variant_str, value_type.span()),
        getter_comment: format!(
            "`{}` is used to retrieve the `{}` item from an [`AuthenticationSettings`] instance",
            getter_str, flag
        ),
        setter_comment: format!(
            "`{}` is used to set the `{}` item in an [`AuthenticationSettings`] instance",
            setter_str, flag
        ),
    }
}

/// Generates `get_x(&self) -> Option<T>` and `set_x(&mut self, T)` for a `PS_X` setting.
#[proc_macro]
pub fn vs_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
        impl AuthenticationSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#return_t> {
                match self.0.get(#flag) {
                    Some(AuthenticationSettingsTypes::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(
                    #flag.to_string(),
                    AuthenticationSettingsTypes::#variant(v),
                );
            }
        }
    };
    tokens.into()
}

/// Generates `get_x(&self) -> T` (falling back to the given default) and `set_x(&mut self, T)`
/// for a `PS_X` setting.
#[proc_macro]
pub fn vs_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let default_value = signature.default_value;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
        impl AuthenticationSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #return_t {
                match self.0.get(#flag) {
                    Some(AuthenticationSettingsTypes::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(
                    #flag.to_string(),
                    AuthenticationSettingsTypes::#variant(v),
                );
            }
        }
    };
    tokens.into()
}
