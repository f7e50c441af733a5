//! Semantic roles attached to grammar node kinds.
//!
//! Roles are language independent: `identifier` in Python and
//! `field_identifier` in Go both carry `Identifier`, so one path query such
//! as `//*[@roleIdentifier]` works across languages.

pub fn roles_for(kind: &str) -> &'static [&'static str] {
    match kind {
        "identifier"
        | "type_identifier"
        | "field_identifier"
        | "property_identifier"
        | "shorthand_property_identifier"
        | "package_identifier"
        | "namespace_identifier"
        | "variable_name"
        | "constant"
        | "simple_identifier" => &["Identifier"],

        "function_definition"
        | "function_declaration"
        | "function_item"
        | "method_definition"
        | "method_declaration"
        | "method"
        | "singleton_method"
        | "constructor_declaration"
        | "arrow_function"
        | "lambda"
        | "closure_expression" => &["Function", "Declaration"],

        "class_definition"
        | "class_declaration"
        | "class"
        | "struct_item"
        | "enum_item"
        | "trait_item"
        | "interface_declaration"
        | "struct_specifier"
        | "type_declaration" => &["Type", "Declaration"],

        "module" | "program" | "source_file" | "translation_unit" | "compilation_unit" => &["File"],

        "call"
        | "call_expression"
        | "method_invocation"
        | "invocation_expression"
        | "macro_invocation"
        | "command" => &["Call"],

        "string"
        | "string_literal"
        | "raw_string_literal"
        | "interpreted_string_literal"
        | "template_string"
        | "encapsed_string"
        | "char_literal"
        | "character_literal" => &["Literal", "String"],

        "integer"
        | "float"
        | "number"
        | "integer_literal"
        | "float_literal"
        | "int_literal"
        | "number_literal"
        | "decimal_integer_literal"
        | "decimal_floating_point_literal"
        | "real_literal" => &["Literal", "Number"],

        "true" | "false" | "boolean" | "boolean_literal" => &["Literal", "Boolean"],

        "comment" | "line_comment" | "block_comment" => &["Comment"],

        "return_statement" | "return_expression" | "return" => &["Return"],

        "if_statement" | "if_expression" | "if" | "elif_clause" | "else_clause" => &["If"],

        "for_statement"
        | "for_expression"
        | "for_in_statement"
        | "enhanced_for_statement"
        | "foreach_statement"
        | "while_statement"
        | "while_expression"
        | "loop_expression"
        | "do_statement"
        | "for"
        | "while"
        | "until" => &["Loop"],

        "binary_operator"
        | "binary_expression"
        | "boolean_operator"
        | "comparison_operator"
        | "unary_operator"
        | "unary_expression"
        | "not_operator" => &["Operator"],

        "assignment"
        | "augmented_assignment"
        | "assignment_expression"
        | "assignment_statement"
        | "compound_assignment_expr"
        | "let_declaration"
        | "short_var_declaration"
        | "variable_assignment" => &["Assignment"],

        "import_statement"
        | "import_from_statement"
        | "import_declaration"
        | "use_declaration"
        | "using_directive"
        | "preproc_include"
        | "namespace_use_declaration" => &["Import"],

        "parameters"
        | "formal_parameters"
        | "parameter_list"
        | "method_parameters"
        | "lambda_parameters"
        | "parameter"
        | "parameter_declaration"
        | "formal_parameter"
        | "required_parameter"
        | "typed_parameter"
        | "default_parameter" => &["Parameter"],

        "argument_list" | "arguments" => &["Argument"],

        "block" | "statement_block" | "compound_statement" | "body_statement" | "do_block" => {
            &["Block"]
        }

        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_across_grammars() {
        for kind in ["identifier", "field_identifier", "type_identifier"] {
            assert_eq!(roles_for(kind), &["Identifier"]);
        }
    }

    #[test]
    fn declarations() {
        assert_eq!(roles_for("function_definition"), &["Function", "Declaration"]);
        assert_eq!(roles_for("class_definition"), &["Type", "Declaration"]);
        assert_eq!(roles_for("module"), &["File"]);
    }

    #[test]
    fn unknown_kind_has_no_roles() {
        assert!(roles_for("expression_statement").is_empty());
        assert!(roles_for("(").is_empty());
    }
}
