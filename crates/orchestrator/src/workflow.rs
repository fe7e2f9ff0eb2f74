//! Generates the provisioning workflow pushed into every new repository.
//!
//! Step names come from [`STEP_TABLE`], resource names from
//! [`lifecycle_core::naming`]: the workflow creates exactly what teardown and
//! the status check later look for.

use lifecycle_core::naming::{self, vars};

use crate::phases::{Phase, StepSpec, STEP_TABLE};

/// Dispatch inputs the workflow declares, in declaration order.
pub const WORKFLOW_INPUTS: &[&str] = &[
    "project_name",
    "domain",
    "domain_code",
    "requester_email",
    "spec_url",
    "environments",
    "postman_team_id",
];

/// Shell expressions the step bodies use for the function base name and the
/// environment of the current loop iteration.
const SHELL_BASE: &str = "${BASE}";
const SHELL_ENV: &str = "${ENV}";
const SHELL_ENV_KEY: &str = "${KEY}";

const HEADER: &str = r#"name: Provision API Lifecycle

on:
  workflow_dispatch:
    inputs:
"#;

const JOB: &str = r#"
permissions:
  contents: write

jobs:
  provision:
    runs-on: ubuntu-latest
    env:
      BASE: ${{ inputs.project_name }}
      DOMAIN: ${{ inputs.domain }}
      DOMAIN_CODE: ${{ inputs.domain_code }}
      REQUESTER_EMAIL: ${{ inputs.requester_email }}
      SPEC_URL: ${{ inputs.spec_url }}
      ENVIRONMENTS: ${{ inputs.environments }}
      TEAM_ID: ${{ inputs.postman_team_id }}
      POSTMAN_API_KEY: ${{ secrets.POSTMAN_API_KEY }}
      GH_TOKEN: ${{ secrets.GH_TOKEN }}
      AWS_REGION: @REGION@
    steps:
      - name: Checkout
        uses: actions/checkout@v4

      - name: Set up Python
        uses: actions/setup-python@v5
        with:
          python-version: "3.12"
"#;

/// Renders the workflow document for a deployment region.
pub fn render_workflow(aws_region: &str) -> String {
    let mut doc = String::from(HEADER);
    for input in WORKFLOW_INPUTS {
        let required = matches!(*input, "project_name" | "requester_email");
        doc.push_str(&format!(
            "      {}:\n        type: string\n        required: {}\n",
            input, required
        ));
    }

    doc.push_str(&JOB.replace("@REGION@", aws_region));

    for phase in Phase::workflow_phases() {
        for spec in phase.steps() {
            doc.push('\n');
            doc.push_str(&render_step(spec));
        }
    }

    doc
}

fn render_step(spec: &StepSpec) -> String {
    let body = step_body(spec.name)
        .map(substitute_names)
        .unwrap_or_else(|| format!("        run: echo \"{}\"\n", spec.name));
    format!("      - name: {}\n{}", spec.name, body)
}

/// Fills in resource-name placeholders from the shared naming rules.
fn substitute_names(body: &str) -> String {
    let function = naming::function_name(SHELL_BASE, SHELL_ENV);
    body.replace("@GATEWAY@", &naming::gateway_name(&function))
        .replace("@FUNCTION@", &function)
        .replace("@ROLE@", &naming::role_name(SHELL_BASE))
        .replace(
            "@GW_URL_VAR@",
            &format!("{}{}", SHELL_ENV_KEY, naming::GATEWAY_URL_SUFFIX),
        )
        .replace("@WORKSPACE_VAR@", vars::POSTMAN_WORKSPACE_ID)
        .replace("@BASELINE_VAR@", vars::BASELINE_COLLECTION_UID)
        .replace("@SMOKE_VAR@", vars::SMOKE_COLLECTION_UID)
        .replace("@CONTRACT_VAR@", vars::CONTRACT_COLLECTION_UID)
        .replace("@FUNCTION_VAR@", vars::FUNCTION_NAME)
        .replace("@LINT_ERRORS_VAR@", vars::LINT_ERRORS)
        .replace("@LINT_WARNINGS_VAR@", vars::LINT_WARNINGS)
}

fn step_body(name: &str) -> Option<&'static str> {
    let body = match name {
        "Install Postman CLI" => {
            r#"        run: |
          curl -o- "https://dl-cli.pstmn.io/install/linux64.sh" | sh
          postman login --with-api-key "$POSTMAN_API_KEY"
"#
        }
        "Create Postman Workspace" => {
            r#"        run: |
          WORKSPACE_ID=$(curl -sf -X POST "https://api.getpostman.com/workspaces" \
            -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
            -d "$(jq -n --arg name "[$DOMAIN_CODE] $BASE" \
              '{workspace: {name: $name, type: "team", description: "Provisioned API lifecycle"}}')" \
            | jq -r '.workspace.id')
          echo "WORKSPACE_ID=$WORKSPACE_ID" >> "$GITHUB_ENV"
          gh variable set @WORKSPACE_VAR@ --body "$WORKSPACE_ID"
"#
        }
        "Assign Workspace to Governance Group" => {
            r#"        run: |
          if [ -z "$TEAM_ID" ]; then
            echo "No team id given, skipping governance assignment"
            exit 0
          fi
          curl -sf -X PATCH "https://api.getpostman.com/workspaces/$WORKSPACE_ID" \
            -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
            -d "$(jq -n --arg domain "$DOMAIN" '{workspace: {tags: [$domain]}}')" \
            || echo "::warning::Governance assignment failed"
"#
        }
        "Invite Requester to Workspace" => {
            r#"        run: |
          curl -sf -X PATCH "https://api.getpostman.com/workspaces/$WORKSPACE_ID/roles" \
            -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
            -d "$(jq -n --arg email "$REQUESTER_EMAIL" \
              '{roles: [{op: "add", path: "/user", value: [{email: $email, role: "EDITOR"}]}]}')" \
            || echo "::warning::Could not invite $REQUESTER_EMAIL"
"#
        }
        "Upload Spec to Spec Hub" => {
            r#"        run: |
          if [ -n "$SPEC_URL" ]; then
            curl -sfL "$SPEC_URL" -o openapi.yaml
          fi
          SPEC_ID=$(curl -sf -X POST "https://api.getpostman.com/specs?workspaceId=$WORKSPACE_ID" \
            -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
            -d "$(jq -n --arg name "$BASE" --rawfile content openapi.yaml \
              '{name: $name, type: "OPENAPI:3.0", files: [{path: "openapi.yaml", content: $content}]}')" \
            | jq -r '.id')
          echo "SPEC_ID=$SPEC_ID" >> "$GITHUB_ENV"
"#
        }
        "Lint Spec via Postman CLI" => {
            r#"        run: |
          postman spec lint openapi.yaml --workspace-id "$WORKSPACE_ID" --output json > lint.json || true
          ERRORS=$(jq '[.violations[]? | select(.severity == "ERROR")] | length' lint.json 2>/dev/null || echo 0)
          WARNINGS=$(jq '[.violations[]? | select(.severity == "WARNING")] | length' lint.json 2>/dev/null || echo 0)
          gh variable set @LINT_ERRORS_VAR@ --body "$ERRORS"
          gh variable set @LINT_WARNINGS_VAR@ --body "$WARNINGS"
"#
        }
        "Generate Collections from Spec" => {
            r#"        run: |
          for KIND in baseline smoke contract; do
            UID_VALUE=$(curl -sf -X POST "https://api.getpostman.com/specs/$SPEC_ID/generations/collection" \
              -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
              -d "$(jq -n --arg name "[$KIND] $BASE" '{name: $name, options: {requestNameSource: "Fallback"}}')" \
              | jq -r '.collection.uid // .details.resources[0].id')
            echo "$(echo "$KIND" | tr '[:lower:]' '[:upper:]')_UID=$UID_VALUE" >> "$GITHUB_ENV"
          done
"#
        }
        "Inject Test Scripts" => {
            r#"        run: |
          for COLLECTION in "$BASELINE_UID" "$SMOKE_UID" "$CONTRACT_UID"; do
            curl -sf "https://api.getpostman.com/collections/$COLLECTION" -H "X-Api-Key: $POSTMAN_API_KEY" \
              | jq '.collection.event = [{listen: "test", script: {type: "text/javascript",
                  exec: ["pm.test(\"status is 2xx\", () => pm.response.to.be.success);"]}}]' \
              | curl -sf -X PUT "https://api.getpostman.com/collections/$COLLECTION" \
                  -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" -d @- > /dev/null
          done
"#
        }
        "Store Postman UIDs" => {
            r#"        run: |
          gh variable set @BASELINE_VAR@ --body "$BASELINE_UID"
          gh variable set @SMOKE_VAR@ --body "$SMOKE_UID"
          gh variable set @CONTRACT_VAR@ --body "$CONTRACT_UID"
"#
        }
        "Configure AWS Credentials" => {
            r#"        uses: aws-actions/configure-aws-credentials@v4
        with:
          aws-access-key-id: ${{ secrets.AWS_ACCESS_KEY_ID }}
          aws-secret-access-key: ${{ secrets.AWS_SECRET_ACCESS_KEY }}
          aws-region: ${{ env.AWS_REGION }}
"#
        }
        "Package Lambda Functions" => {
            r#"        run: |
          pip install -r requirements.txt -t package
          cp -r app package/
          (cd package && zip -qr ../function.zip .)
"#
        }
        "Deploy Lambda Functions" => {
            r#"        run: |
          ROLE_NAME="@ROLE@"
          if ! ROLE_ARN=$(aws iam get-role --role-name "$ROLE_NAME" --query 'Role.Arn' --output text 2>/dev/null); then
            ROLE_ARN=$(aws iam create-role --role-name "$ROLE_NAME" \
              --assume-role-policy-document '{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"lambda.amazonaws.com"},"Action":"sts:AssumeRole"}]}' \
              --query 'Role.Arn' --output text)
            aws iam attach-role-policy --role-name "$ROLE_NAME" \
              --policy-arn arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole
            sleep 10
          fi
          for ENV in $(echo "$ENVIRONMENTS" | jq -r '.[]'); do
            FUNCTION="@FUNCTION@"
            if aws lambda get-function --function-name "$FUNCTION" > /dev/null 2>&1; then
              aws lambda update-function-code --function-name "$FUNCTION" --zip-file fileb://function.zip > /dev/null
            else
              aws lambda create-function --function-name "$FUNCTION" --runtime python3.12 \
                --handler app.wsgi.handler --role "$ROLE_ARN" --zip-file fileb://function.zip \
                --environment "Variables={ENVIRONMENT=$ENV}" > /dev/null
            fi
          done
          gh variable set @FUNCTION_VAR@ --body "$BASE"
"#
        }
        "Create API Gateways" => {
            r#"        run: |
          ACCOUNT_ID=$(aws sts get-caller-identity --query Account --output text)
          for ENV in $(echo "$ENVIRONMENTS" | jq -r '.[]'); do
            FUNCTION="@FUNCTION@"
            GATEWAY="@GATEWAY@"
            KEY=$(echo "$ENV" | tr '[:lower:]-' '[:upper:]_')
            API_ID=$(aws apigatewayv2 get-apis --query "Items[?Name=='$GATEWAY'].ApiId" --output text)
            if [ -z "$API_ID" ] || [ "$API_ID" = "None" ]; then
              API_ID=$(aws apigatewayv2 create-api --name "$GATEWAY" --protocol-type HTTP \
                --target "arn:aws:lambda:$AWS_REGION:$ACCOUNT_ID:function:$FUNCTION" \
                --query ApiId --output text)
              aws lambda add-permission --function-name "$FUNCTION" --statement-id apigateway-invoke \
                --action lambda:InvokeFunction --principal apigateway.amazonaws.com \
                --source-arn "arn:aws:execute-api:$AWS_REGION:$ACCOUNT_ID:$API_ID/*" > /dev/null
            fi
            gh variable set "@GW_URL_VAR@" --body "https://$API_ID.execute-api.$AWS_REGION.amazonaws.com"
          done
"#
        }
        "Health Check" => {
            r#"        run: |
          for ENV in $(echo "$ENVIRONMENTS" | jq -r '.[]'); do
            KEY=$(echo "$ENV" | tr '[:lower:]-' '[:upper:]_')
            ENDPOINT=$(gh variable get "@GW_URL_VAR@")
            curl -sf --retry 5 --retry-delay 3 --retry-all-errors "$ENDPOINT/health"
          done
"#
        }
        "Create Postman Environments" => {
            r#"        run: |
          ENV_UIDS="{}"
          for ENV in $(echo "$ENVIRONMENTS" | jq -r '.[]'); do
            KEY=$(echo "$ENV" | tr '[:lower:]-' '[:upper:]_')
            ENDPOINT=$(gh variable get "@GW_URL_VAR@")
            ENV_UID=$(curl -sf -X POST "https://api.getpostman.com/environments?workspace=$WORKSPACE_ID" \
              -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
              -d "$(jq -n --arg name "$BASE - $ENV" --arg url "$ENDPOINT" \
                '{environment: {name: $name, values: [{key: "baseUrl", value: $url, enabled: true}]}}')" \
              | jq -r '.environment.uid')
            ENV_UIDS=$(echo "$ENV_UIDS" | jq -c --arg env "$ENV" --arg uid "$ENV_UID" '. + {($env): $uid}')
          done
          echo "ENV_UIDS=$ENV_UIDS" >> "$GITHUB_ENV"
"#
        }
        "Create Mock Server" => {
            r#"        run: |
          MOCK_URL=$(curl -sf -X POST "https://api.getpostman.com/mocks?workspace=$WORKSPACE_ID" \
            -H "X-Api-Key: $POSTMAN_API_KEY" -H "Content-Type: application/json" \
            -d "$(jq -n --arg name "$BASE mock" --arg collection "$BASELINE_UID" \
              '{mock: {name: $name, collection: $collection, private: false}}')" \
            | jq -r '.mock.mockUrl')
          echo "MOCK_URL=$MOCK_URL" >> "$GITHUB_ENV"
"#
        }
        "Store Environment UIDs" => {
            r#"        run: |
          gh variable set POSTMAN_ENVIRONMENT_UIDS --body "$ENV_UIDS"
          gh variable set POSTMAN_MOCK_URL --body "$MOCK_URL"
"#
        }
        "Export Postman Artifacts to Repo" => {
            r#"        run: |
          mkdir -p postman/collections postman/environments
          for KIND in baseline smoke contract; do
            VAR="$(echo "$KIND" | tr '[:lower:]' '[:upper:]')_UID"
            curl -sf "https://api.getpostman.com/collections/${!VAR}" -H "X-Api-Key: $POSTMAN_API_KEY" \
              | jq '.collection' > "postman/collections/$KIND.json"
          done
          for ENV_UID in $(echo "$ENV_UIDS" | jq -r '.[]'); do
            curl -sf "https://api.getpostman.com/environments/$ENV_UID" -H "X-Api-Key: $POSTMAN_API_KEY" \
              | jq '.environment' > "postman/environments/$ENV_UID.json"
          done
"#
        }
        "Connect Workspace to Repository" => {
            r#"        run: |
          jq -n --arg workspace "$WORKSPACE_ID" --arg repo "$GITHUB_REPOSITORY" \
            '{workspace: $workspace, repository: $repo, collections: "postman/collections"}' \
            > postman/workspace.json
"#
        }
        "Commit Artifacts" => {
            r#"        run: |
          git config user.name "github-actions[bot]"
          git config user.email "github-actions[bot]@users.noreply.github.com"
          git add postman
          git diff --cached --quiet || git commit -m "Sync Postman artifacts"
          git push
"#
        }
        _ => return None,
    };
    Some(body)
}

/// Every mapped step name, in workflow order.
pub fn mapped_step_names() -> impl Iterator<Item = &'static str> {
    STEP_TABLE.iter().map(|spec| spec.name)
}
